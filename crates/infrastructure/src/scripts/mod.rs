pub mod command;
pub mod function;
pub mod registry;

pub use command::CommandScriptHook;
pub use function::FnScriptHook;
pub use registry::ScriptRegistry;

use dnsroute_application::ports::{ScriptCall, ScriptHook, ScriptOutcome};
use std::panic::{catch_unwind, AssertUnwindSafe};

type HookFn = dyn Fn(&ScriptCall<'_>) -> Result<Vec<String>, String> + Send + Sync;

/// Script hook implemented in Rust and registered under a name.
pub struct FnScriptHook {
    func: Box<HookFn>,
}

impl FnScriptHook {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&ScriptCall<'_>) -> Result<Vec<String>, String> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }
}

impl ScriptHook for FnScriptHook {
    fn invoke(&self, call: &ScriptCall<'_>) -> ScriptOutcome {
        match catch_unwind(AssertUnwindSafe(|| (self.func)(call))) {
            Ok(Ok(values)) => ScriptOutcome::Values(values),
            Ok(Err(reason)) => ScriptOutcome::Failed(reason),
            Err(_) => ScriptOutcome::Failed("script panicked".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn call<'a>(kwargs: &'a BTreeMap<String, serde_json::Value>) -> ScriptCall<'a> {
        ScriptCall {
            query_name: "svc.example.com",
            query_class: 1,
            query_type: 1,
            args: &[],
            kwargs,
        }
    }

    #[test]
    fn test_values_and_failures() {
        let kwargs = BTreeMap::new();
        let echo = FnScriptHook::new(|call| Ok(vec![call.query_name.to_uppercase()]));
        let broken = FnScriptHook::new(|_| Err("backend unavailable".to_string()));

        assert_eq!(
            echo.invoke(&call(&kwargs)),
            ScriptOutcome::single("SVC.EXAMPLE.COM")
        );
        assert_eq!(
            broken.invoke(&call(&kwargs)),
            ScriptOutcome::Failed("backend unavailable".to_string())
        );
    }

    #[test]
    fn test_panic_is_a_failure() {
        let kwargs = BTreeMap::new();
        let panicking = FnScriptHook::new(|_| panic!("bug in hook"));
        assert!(matches!(
            panicking.invoke(&call(&kwargs)),
            ScriptOutcome::Failed(_)
        ));
    }
}

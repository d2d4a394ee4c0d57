use crate::dns::wire::{self, Header, ParsedQuery, Reply};
use dnsroute_application::use_cases::{HandleDnsQueryUseCase, QueryOutcome};
use hickory_proto::op::{Message, OpCode, ResponseCode};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Listener a request arrived on. UDP replies are size-limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Udp => f.write_str("UDP"),
            Protocol::Tcp => f.write_str("TCP"),
        }
    }
}

/// Answers queries from the route table. UDP workers call [`handle`] with
/// raw datagrams; TCP connections arrive through hickory's server as a
/// [`RequestHandler`].
///
/// [`handle`]: DnsServerHandler::handle
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self { use_case }
    }

    /// `None` means the packet gets no reply at all (too short to carry an
    /// ID, or itself a response).
    pub async fn handle(&self, request: &[u8], client: SocketAddr, protocol: Protocol) -> Option<Vec<u8>> {
        let header = Header::peek(request)?;
        if header.is_response() {
            debug!(client = %client, "Ignoring DNS response sent to server");
            return None;
        }

        if header.opcode() != 0 {
            debug!(client = %client, opcode = header.opcode(), "Refusing non-QUERY opcode");
            return non_empty(error_reply(header, None, ResponseCode::Refused).wire);
        }

        let query = match wire::parse_query(request) {
            Ok(query) => query,
            Err(e) => {
                warn!(client = %client, error = %e, "Malformed DNS query");
                return non_empty(error_reply(header, None, ResponseCode::FormErr).wire);
            }
        };

        let reply = self.respond(&query, request, client, protocol).await;
        let response = match protocol {
            Protocol::Udp => wire::fit_udp(&query, reply),
            Protocol::Tcp => Ok(reply.wire),
        };

        match response {
            Ok(bytes) => non_empty(bytes),
            Err(e) => {
                error!(domain = %query.name, error = %e, "Failed to encode response");
                None
            }
        }
    }

    /// Routed records when they encode; otherwise the same path an unmatched
    /// query takes.
    async fn respond(&self, query: &ParsedQuery, raw: &[u8], client: SocketAddr, protocol: Protocol) -> Reply {
        let start = Instant::now();
        info!(
            domain = %query.name,
            record_type = query.qtype,
            client = %client,
            protocol = %protocol,
            "DNS query received"
        );

        let route_query = query.route_query();
        let outcome = self.use_case.execute(&route_query, raw).await;
        let mut status = outcome.as_str();

        let reply = match outcome {
            QueryOutcome::Answered(answers) => {
                match wire::answer_message(query, &answers).and_then(Reply::encode) {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!(
                            domain = %query.name,
                            answers = answers.len(),
                            error = %e,
                            "Routed answer cannot be encoded, falling back"
                        );
                        let fallback = self.use_case.fallback(&route_query, raw).await;
                        status = fallback.as_str();
                        reply_without_records(query, fallback)
                    }
                }
            }
            other => reply_without_records(query, other),
        };

        debug!(
            domain = %query.name,
            status,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Sending response"
        );

        reply
    }
}

#[async_trait::async_trait]
impl RequestHandler for DnsServerHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        if request.header().op_code() != OpCode::Query {
            debug!(client = %request.src(), "Refusing non-QUERY opcode");
            return send_error_response(request, &mut response_handle, ResponseCode::Refused).await;
        }

        let request_info = match request.request_info() {
            Ok(info) => info,
            Err(e) => {
                warn!(client = %request.src(), error = %e, "Failed to parse request info");
                return send_error_response(request, &mut response_handle, ResponseCode::FormErr)
                    .await;
            }
        };

        let raw = wire::encode_query(
            request.header().id(),
            request.header().recursion_desired(),
            request_info.query.original().clone(),
        );
        let (raw, query) = match raw.and_then(|raw| wire::parse_query(&raw).map(|query| (raw, query))) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(client = %request.src(), error = %e, "Malformed DNS query");
                return send_error_response(request, &mut response_handle, ResponseCode::FormErr)
                    .await;
            }
        };

        let reply = self.respond(&query, &raw, request.src(), Protocol::Tcp).await;

        let builder = MessageResponseBuilder::from_message_request(request);
        let header = *reply.message.header();
        let response = builder.build(
            header,
            reply.message.answers().iter(),
            reply.message.name_servers().iter(),
            &[],
            reply.message.additionals().iter(),
        );

        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                error!(domain = %query.name, error = %e, "Failed to send response");
                ResponseInfo::from(*request.header())
            }
        }
    }
}

async fn send_error_response<R: ResponseHandler>(
    request: &Request,
    response_handle: &mut R,
    code: ResponseCode,
) -> ResponseInfo {
    debug!(code = ?code, "Sending error response");
    let builder = MessageResponseBuilder::from_message_request(request);
    let mut header = *request.header();
    header.set_response_code(code);
    header.set_recursion_available(true);
    let response = builder.build(header, &[], &[], &[], &[]);

    match response_handle.send_response(response).await {
        Ok(info) => info,
        Err(e) => {
            error!(error = %e, "Failed to send error response");
            ResponseInfo::from(*request.header())
        }
    }
}

/// Upstream bytes pass through untouched; everything else becomes an
/// answerless response.
fn reply_without_records(query: &ParsedQuery, outcome: QueryOutcome) -> Reply {
    let rcode = match outcome {
        QueryOutcome::Forwarded(wire) => match Message::from_vec(&wire) {
            Ok(message) => return Reply { message, wire },
            Err(e) => {
                warn!(domain = %query.name, error = %e, "Upstream response cannot be decoded");
                ResponseCode::ServFail
            }
        },
        QueryOutcome::NxDomain => ResponseCode::NXDomain,
        QueryOutcome::ServFail | QueryOutcome::Answered(_) => ResponseCode::ServFail,
    };
    error_reply(query.header, Some(query), rcode)
}

fn error_reply(header: Header, query: Option<&ParsedQuery>, rcode: ResponseCode) -> Reply {
    let message = wire::error_message(header, query, rcode);
    let wire = wire::encode(&message).unwrap_or_else(|e| {
        error!(code = ?rcode, error = %e, "Failed to encode error response");
        Vec::new()
    });
    Reply { message, wire }
}

fn non_empty(bytes: Vec<u8>) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then_some(bytes)
}

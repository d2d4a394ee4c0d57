#![allow(dead_code)]
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::SocketAddr;
use std::str::FromStr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const QUERY_ID: u16 = 0x5150;

pub fn encode_query(name: &str, record_type: RecordType) -> Vec<u8> {
    let mut query = Query::new();
    query.set_name(Name::from_str(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);

    let mut message = Message::new(QUERY_ID, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).unwrap();
    buf
}

pub fn rcode(response: &[u8]) -> u8 {
    response[3] & 0x0F
}

pub fn answer_count(response: &[u8]) -> u16 {
    u16::from_be_bytes([response[6], response[7]])
}

pub fn response_id(response: &[u8]) -> u16 {
    u16::from_be_bytes([response[0], response[1]])
}

/// One length-prefixed exchange on a fresh TCP connection.
pub async fn tcp_exchange(server: SocketAddr, query: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(server).await.unwrap();
    stream.write_all(&(query.len() as u16).to_be_bytes()).await.unwrap();
    stream.write_all(query).await.unwrap();

    let mut len = [0u8; 2];
    stream.read_exact(&mut len).await.unwrap();
    let mut response = vec![0u8; u16::from_be_bytes(len) as usize];
    stream.read_exact(&mut response).await.unwrap();
    response
}

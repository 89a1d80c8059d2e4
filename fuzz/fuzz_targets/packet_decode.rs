//! Packet decoding on arbitrary bytes.
//!
//! Decoding must never panic, and anything that decodes must encode back to
//! the same bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tftp_proto::{Data, Packet};

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = Packet::decode(data) {
        let encoded = packet.to_bytes().unwrap();
        // Mode names are case-insensitive on the way in and lowercase on the
        // way out, so only the length is stable for requests.
        match packet {
            Packet::ReadRequest(_) | Packet::WriteRequest(_) => {
                assert_eq!(encoded.len(), data.len());
            },
            Packet::Data(_) | Packet::Ack(_) => assert_eq!(&encoded[..], data),
        }
    }

    if let Ok((_, payload)) = Data::parse_view(data) {
        assert!(payload.len() <= tftp_proto::BLOCK_SIZE);
    }
});

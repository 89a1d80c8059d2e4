//! Transfer state machine driven by arbitrary peer packets.
//!
//! The first byte picks the session kind; the rest is split into frames.
//! Whatever arrives, the state machine must answer with an error or a valid
//! action list, and a lockstep violation must leave it failed.

#![no_main]

use std::collections::VecDeque;

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use tftp_core::{Transfer, TransferAction, TransferState};
use tftp_proto::{BLOCK_SIZE, Packet};

fuzz_target!(|data: &[u8]| {
    let Some((&kind, rest)) = data.split_first() else {
        return;
    };

    let mut transfer = if kind & 1 == 0 {
        Transfer::write()
    } else {
        match Transfer::read(u64::from(kind) * 97) {
            Ok(transfer) => transfer,
            Err(_) => return,
        }
    };

    let mut pending = match transfer.start() {
        Ok(actions) => VecDeque::from(actions),
        Err(_) => return,
    };

    let mut frames = rest.split(|&b| b == 0xFF);
    while let Some(action) = pending.pop_front() {
        let next = match action {
            TransferAction::ReadBlock => {
                transfer.block_read(Bytes::from(vec![0u8; BLOCK_SIZE / 2]))
            },
            TransferAction::AwaitPacket => {
                let Some(frame) = frames.next() else {
                    return;
                };
                let Ok(packet) = Packet::decode(frame) else {
                    return;
                };
                transfer.handle_packet(packet)
            },
            TransferAction::SendPacket(_) | TransferAction::WriteBlock(_) => continue,
            TransferAction::Complete => {
                assert_eq!(transfer.state(), TransferState::Complete);
                return;
            },
        };

        match next {
            Ok(actions) => pending.extend(actions),
            Err(err) => {
                if err.is_sequencing_violation() {
                    assert_eq!(transfer.state(), TransferState::Failed);
                }
                return;
            },
        }
    }
});

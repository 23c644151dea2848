//! Fuzz target: `decode_command`
//!
//! Arbitrary payloads must decode or fail cleanly; an accepted path
//! never exceeds the route capacity.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use nursery_agv::fsm::path::MAX_PATH_LEN;
use nursery_agv::rpc::protocol::{Command, MoveTarget, Response, decode_command};

fuzz_target!(|data: &[u8]| {
    match decode_command(data) {
        Ok(Command::Move(MoveTarget::Path(path))) => {
            assert!(!path.is_empty());
            assert!(path.len() <= MAX_PATH_LEN);
        }
        Ok(_) => {}
        Err(e) => {
            assert!(!Response::fail(e).msg.is_empty());
        }
    }
});

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use voltage_modbus_slave::{ModbusSlave, RegisterBank, MAX_REGISTER_VALUE};

fuzz_target!(|data: &[u8]| {
    let slave = ModbusSlave::new(1, Arc::new(RegisterBank::new()));
    let before = slave.bank().snapshot();

    match slave.process(data) {
        // Dropped frames and exceptions must not touch the bank
        None => assert_eq!(slave.bank().snapshot(), before),
        Some(reply) if reply.len() == 9 => assert_eq!(slave.bank().snapshot(), before),
        Some(_) => {}
    }
    assert!(slave.bank().snapshot().iter().all(|&v| v <= MAX_REGISTER_VALUE));
});

//! Wire-level properties of the transaction engine over the simulated bus

use kibble_core::twi::sim::{BusEvent, SimDevice, SimTwi, REGISTER_COUNT};
use kibble_core::twi::{BusState, TransactionEngine, TwiError, WaitPolicy};
use kibble_hal::twi::TwiConfig;
use proptest::prelude::*;

const ADDRESS: u8 = 0x68;

fn engine(sim: SimTwi) -> TransactionEngine<SimTwi> {
    let mut engine = TransactionEngine::new(sim, TwiConfig::STANDARD, WaitPolicy::Spins(8));
    engine.init();
    engine
}

fn reads(log: &[BusEvent]) -> Vec<bool> {
    log.iter()
        .filter_map(|e| match e {
            BusEvent::Read { ack, .. } => Some(*ack),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn read_acks_all_but_last(len in 1usize..=REGISTER_COUNT) {
        let mut engine = engine(SimTwi::with_device(SimDevice::new(ADDRESS)));
        let mut buf = vec![0u8; len];

        prop_assert_eq!(engine.read(ADDRESS, &mut buf), Ok(()));

        let acks = reads(engine.controller().hardware().log());
        prop_assert_eq!(acks.len(), len);
        prop_assert!(acks[..len - 1].iter().all(|ack| *ack));
        prop_assert!(!acks[len - 1]);
        prop_assert_eq!(engine.state(), BusState::Idle);
    }

    #[test]
    fn read_returns_register_contents(
        start in 0u8..32,
        contents in proptest::collection::vec(any::<u8>(), 32),
    ) {
        let mut device = SimDevice::new(ADDRESS);
        device.registers_mut()[32..].copy_from_slice(&contents);
        let mut engine = engine(SimTwi::with_device(device));
        let mut buf = [0u8; 8];

        let pointer = 32 + start;
        prop_assert_eq!(engine.write_read(ADDRESS, &[pointer], &mut buf), Ok(()));
        for (i, byte) in buf.iter().enumerate() {
            let reg = (usize::from(pointer) + i) % REGISTER_COUNT;
            let expected = if reg >= 32 { contents[reg - 32] } else { 0 };
            prop_assert_eq!(*byte, expected);
        }
    }

    #[test]
    fn absent_device_always_nacks_address(address in 0x08u8..0x78, len in 0usize..16) {
        prop_assume!(address != ADDRESS);
        let mut engine = engine(SimTwi::with_device(SimDevice::new(ADDRESS)));
        let mut buf = vec![0u8; len];

        prop_assert_eq!(engine.read(address, &mut buf), Err(TwiError::AddressNack));
        prop_assert_eq!(engine.write(address, &buf), Err(TwiError::AddressNack));
        prop_assert_eq!(engine.state(), BusState::Idle);
        prop_assert_eq!(engine.controller().hardware().log().last(), Some(&BusEvent::Stop));
    }

    #[test]
    fn write_stores_bytes_after_pointer(
        pointer in 0u8..48,
        data in proptest::collection::vec(any::<u8>(), 1..16),
    ) {
        let mut engine = engine(SimTwi::with_device(SimDevice::new(ADDRESS)));
        let mut frame = vec![pointer];
        frame.extend_from_slice(&data);

        prop_assert_eq!(engine.write(ADDRESS, &frame), Ok(()));
        let device = engine.controller().hardware().device().unwrap();
        let start = usize::from(pointer);
        prop_assert_eq!(&device.registers()[start..start + data.len()], data.as_slice());
    }
}

//! Acquisition against real serial hardware.
//!
//! Requires an attached board. Run with:
//! `TEST_PORT=/dev/ttyACM0 cargo test --features hardware-tests -- --ignored`

#![cfg(feature = "hardware-tests")]

use serial_link::detect::{PortDetector, UsbPortDetector};
use serial_link::link::{LinkAcquirer, PortSpec, RetryPolicy};
use serial_link::port::{SerialLinkPort, SystemPortOpener, TransportParams};
use std::env;
use std::time::Duration;

fn test_port() -> Option<String> {
    env::var("TEST_PORT").ok()
}

#[test]
#[ignore]
fn test_usb_detection_reports_known_board() {
    let Some(found) = UsbPortDetector::new().detect().unwrap() else {
        println!("no known board attached, skipping");
        return;
    };
    println!("found {} ({:?})", found.port_name, found.device_type);
    assert!(!found.port_name.is_empty());
    assert!(found.device_type.is_some());
}

#[test]
#[ignore]
fn test_acquire_explicit_port() {
    let Some(port) = test_port() else {
        println!("TEST_PORT not set, skipping");
        return;
    };

    let acquirer = LinkAcquirer::new(SystemPortOpener, UsbPortDetector::new())
        .with_policy(RetryPolicy::new(3, Duration::from_millis(500)));
    let acquired = acquirer
        .acquire(&[PortSpec::explicit(&port), PortSpec::None], &TransportParams::default())
        .unwrap();

    assert_eq!(acquired.port_name, port);
    assert_eq!(acquired.link.name(), port);
}

#[test]
#[ignore]
fn test_missing_port_then_auto() {
    let acquirer = LinkAcquirer::new(SystemPortOpener, UsbPortDetector::new())
        .with_policy(RetryPolicy::new(1, Duration::ZERO));
    let result = acquirer.acquire(
        &[PortSpec::explicit("/dev/does-not-exist"), PortSpec::Auto],
        &TransportParams::default(),
    );

    match result {
        Ok(acquired) => {
            assert_eq!(acquired.spec, PortSpec::Auto);
            assert_eq!(acquired.attempts.len(), 1);
        }
        Err(err) => {
            let last = err.last_attempts().unwrap();
            assert_eq!(last.len(), 2);
        }
    }
}

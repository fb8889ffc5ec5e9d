//! Send/Sync guarantees for core types.

use logship::{
    ClientBuilder, ClientConfig, ClientError, CollectorClient, Endpoint, LogRecord, Logger,
    RetryPolicy, TcpTransport,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn configuration_is_send_sync() {
    assert_impl_all!(ClientBuilder: Send, Sync);
    assert_impl_all!(ClientConfig: Send, Sync);
    assert_impl_all!(Endpoint: Send, Sync);
    assert_impl_all!(RetryPolicy: Send, Sync);
}

#[rstest]
fn values_are_send_sync() {
    assert_impl_all!(LogRecord: Send, Sync);
    assert_impl_all!(ClientError: Send, Sync);
}

#[rstest]
fn clients_move_between_threads() {
    assert_impl_all!(CollectorClient: Send);
    assert_impl_all!(Logger: Send);
    assert_impl_all!(TcpTransport: Send);
}

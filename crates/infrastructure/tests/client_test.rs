//! Lookup client behavior: option composition, the per-query server
//! override, single-flight collapsing and the blocking entry point.

mod helpers;

use helpers::builders::*;
use helpers::mocks::{Reply, ScriptedDiscovery, ScriptedTransport};

use ferrous_resolver_application::ports::{DnsTransport, ServerDiscovery};
use ferrous_resolver_domain::{QueryOptions, RecordType, ResolverOptions, ServerEndpoint};
use ferrous_resolver_infrastructure::LookupClient;
use std::sync::Arc;
use std::time::Duration;

fn options_with(adjust: impl FnOnce(&mut ResolverOptions)) -> ResolverOptions {
    let mut options = ResolverOptions {
        servers: vec!["127.0.0.1:5300".parse().unwrap()],
        use_random_name_server: false,
        auto_resolve_name_servers: false,
        ..Default::default()
    };
    adjust(&mut options);
    options
}

fn client_with(
    udp: &Arc<ScriptedTransport>,
    options: ResolverOptions,
) -> LookupClient {
    LookupClient::builder()
        .with_options(options)
        .with_udp_transport(Arc::clone(udp) as Arc<dyn DnsTransport>)
        .with_tcp_transport(ScriptedTransport::tcp([]) as Arc<dyn DnsTransport>)
        .build()
        .unwrap()
}

#[tokio::test]
async fn query_resolves_through_configured_server() {
    let udp = ScriptedTransport::udp([Reply::Answer(a_response("example.com", 60, EXAMPLE_IP))]);
    let client = client_with(&udp, options_with(|_| {}));

    let response = client.query("example.com", RecordType::A).await.unwrap();

    assert_eq!(response.answers.len(), 1);
    assert_eq!(
        udp.sent_servers(),
        vec!["127.0.0.1:5300".parse::<ServerEndpoint>().unwrap()]
    );
}

#[tokio::test]
async fn per_query_servers_override_roster_and_suppress_discovery() {
    let udp = ScriptedTransport::udp([Reply::Answer(a_response("example.com", 60, EXAMPLE_IP))]);
    let discovery = ScriptedDiscovery::returning(vec!["9.9.9.9:53".parse().unwrap()]);

    let client = LookupClient::builder()
        .with_options(options_with(|o| o.auto_resolve_name_servers = true))
        .with_udp_transport(Arc::clone(&udp) as Arc<dyn DnsTransport>)
        .with_tcp_transport(ScriptedTransport::tcp([]) as Arc<dyn DnsTransport>)
        .with_discovery(Arc::clone(&discovery) as Arc<dyn ServerDiscovery>)
        .build()
        .unwrap();

    let overrides = QueryOptions {
        servers: vec!["127.0.0.9:5399".parse().unwrap()],
        use_random_name_server: Some(false),
        ..Default::default()
    };
    let response = client
        .query_with_options(question("example.com"), overrides)
        .await
        .unwrap();

    assert_eq!(response.answers.len(), 1);
    // the override list replaced the roster entirely
    assert_eq!(
        udp.sent_servers(),
        vec!["127.0.0.9:5399".parse::<ServerEndpoint>().unwrap()]
    );
    // and discovery never ran for this query
    assert_eq!(discovery.calls(), 0);
}

#[tokio::test]
async fn discovered_servers_are_used_when_auto_resolve_is_on() {
    let udp = ScriptedTransport::udp([Reply::Answer(a_response("example.com", 60, EXAMPLE_IP))]);
    let discovery = ScriptedDiscovery::returning(vec!["127.0.0.7:5307".parse().unwrap()]);

    let client = LookupClient::builder()
        .with_options(ResolverOptions {
            servers: Vec::new(),
            use_random_name_server: false,
            ..Default::default()
        })
        .with_udp_transport(Arc::clone(&udp) as Arc<dyn DnsTransport>)
        .with_tcp_transport(ScriptedTransport::tcp([]) as Arc<dyn DnsTransport>)
        .with_discovery(Arc::clone(&discovery) as Arc<dyn ServerDiscovery>)
        .build()
        .unwrap();

    let response = client.query("example.com", RecordType::A).await.unwrap();

    assert_eq!(response.answers.len(), 1);
    assert_eq!(discovery.calls(), 1);
    assert_eq!(
        udp.sent_servers(),
        vec!["127.0.0.7:5307".parse::<ServerEndpoint>().unwrap()]
    );
}

#[tokio::test]
async fn empty_roster_fails_before_any_io() {
    let udp = ScriptedTransport::udp([]);
    let client = client_with(
        &udp,
        ResolverOptions {
            servers: Vec::new(),
            auto_resolve_name_servers: false,
            ..Default::default()
        },
    );

    let result = client.query("example.com", RecordType::A).await;

    assert!(matches!(
        result,
        Err(ferrous_resolver_domain::ResolveError::EmptyServers)
    ));
    assert_eq!(udp.sent_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_identical_questions_collapse_to_one_upstream_query() {
    let udp = ScriptedTransport::udp([Reply::AnswerAfter(
        a_response("example.com", 60, EXAMPLE_IP),
        Duration::from_millis(50),
    )]);
    let client = Arc::new(client_with(&udp, options_with(|o| o.retries = 0)));

    let first = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.query("example.com", RecordType::A).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.query("example.com", RecordType::A).await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_eq!(first.answers, second.answers);
    assert_eq!(udp.sent_count(), 1, "followers must share the leader's result");
}

#[tokio::test]
async fn invalid_name_is_rejected_without_io() {
    let udp = ScriptedTransport::udp([]);
    let client = client_with(&udp, options_with(|_| {}));

    let result = client.query("bad..name", RecordType::A).await;

    assert!(matches!(
        result,
        Err(ferrous_resolver_domain::ResolveError::InvalidName(_))
    ));
    assert_eq!(udp.sent_count(), 0);
}

#[test]
fn blocking_entry_point_resolves_without_an_ambient_runtime() {
    let udp = ScriptedTransport::udp([Reply::Answer(a_response("example.com", 60, EXAMPLE_IP))]);
    let client = client_with(&udp, options_with(|_| {}));

    let response = client.query_sync("example.com", RecordType::A).unwrap();

    assert_eq!(response.answers.len(), 1);
    assert_eq!(udp.sent_count(), 1);
}

#[tokio::test]
async fn lookup_host_merges_a_and_aaaa_answers() {
    let udp = ScriptedTransport::udp([
        Reply::Answer(a_response("example.com", 60, EXAMPLE_IP)),
        Reply::Answer(empty_response("example.com")),
    ]);
    // empty AAAA means the second query rotates nowhere: single server,
    // empty answer comes straight back
    let client = client_with(&udp, options_with(|o| o.use_cache = false));

    let addresses = client.lookup_host("example.com").await.unwrap();

    assert_eq!(addresses, vec![std::net::IpAddr::V4(EXAMPLE_IP)]);
    assert_eq!(udp.sent_count(), 2);
}

#[tokio::test]
async fn builder_rejects_invalid_options() {
    let result = LookupClient::builder()
        .with_options(ResolverOptions {
            timeout: Some(Duration::ZERO),
            ..Default::default()
        })
        .build();
    assert!(result.is_err());
}

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use indoc::indoc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use fed_sparql::engine::http::{HttpEngineSettings, HttpSparqlEngine};
use fed_sparql::engine::Term;
use fed_sparql::federation::ConfiguredCatalog;
use fed_sparql::session::{QuerySession, RunState, SessionSettings};
use fed_sparql::shared::config::model::SourceConfig;

fn sparql_source(shortname: &str, endpoint: String, selected: bool) -> SourceConfig {
    SourceConfig {
        name: format!("{} endpoint", shortname),
        shortname: shortname.to_string(),
        kind: "sparql".to_string(),
        endpoint: Some(endpoint),
        sparql_endpoint: None,
        tpf_endpoint: None,
        selected,
    }
}

fn session_for(sources: &[SourceConfig]) -> QuerySession {
    let catalog = ConfiguredCatalog::from_config(sources).expect("catalog");
    QuerySession::from_catalog(
        Arc::new(HttpSparqlEngine::new(HttpEngineSettings::default())),
        &catalog,
        SessionSettings {
            timer_tick: Duration::from_millis(20),
        },
    )
}

async fn until<F: Fn(&QuerySession) -> bool>(session: &QuerySession, predicate: F) {
    let mut changes = session.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !predicate(session) {
            if changes.changed().await.is_err() {
                return;
            }
        }
    })
    .await
    .expect("condition not reached");
}

/// Answers every request on one connection with the same complete body.
async fn serve_fixed(content_type: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let service = service_fn(move |_req: Request<Incoming>| async move {
            Ok::<_, Infallible>(
                Response::builder()
                    .header(hyper::header::CONTENT_TYPE, content_type)
                    .body(Full::new(Bytes::from_static(body.as_bytes())))
                    .expect("response"),
            )
        });
        let _ = http1::Builder::new()
            .serve_connection(TokioIo::new(stream), service)
            .await;
    });
    addr
}

/// Answers with a body whose chunks the test pushes through the returned sender.
async fn serve_streaming(content_type: &'static str) -> (SocketAddr, mpsc::Sender<Bytes>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = mpsc::channel::<Bytes>(16);
    let chunks = Arc::new(tokio::sync::Mutex::new(Some(rx)));

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let service = service_fn(move |_req: Request<Incoming>| {
            let chunks = Arc::clone(&chunks);
            async move {
                let rx = chunks.lock().await.take().expect("single request");
                let frames = futures::stream::unfold(rx, |mut rx| async move {
                    rx.recv()
                        .await
                        .map(|chunk| (Ok::<_, Infallible>(Frame::data(chunk)), rx))
                });
                Ok::<_, Infallible>(
                    Response::builder()
                        .header(hyper::header::CONTENT_TYPE, content_type)
                        .body(StreamBody::new(frames))
                        .expect("response"),
                )
            }
        });
        let _ = http1::Builder::new()
            .serve_connection(TokioIo::new(stream), service)
            .await;
    });
    (addr, tx)
}

#[tokio::test]
async fn select_over_http_settles_with_all_rows() {
    let addr = serve_fixed(
        "application/sparql-results+json",
        indoc! {r#"
            {
              "head": { "vars": ["s", "label"] },
              "results": { "bindings": [
                { "s": { "type": "uri", "value": "http://ex.org/a" },
                  "label": { "type": "literal", "value": "A", "xml:lang": "en" } },
                { "s": { "type": "uri", "value": "http://ex.org/b" } },
                { "s": { "type": "uri", "value": "http://ex.org/c" },
                  "label": { "type": "literal", "value": "C" } }
              ] }
            }
        "#},
    )
    .await;
    let session = session_for(&[sparql_source("local", format!("http://{}/sparql", addr), true)]);
    session.set_query_text("SELECT ?s ?label WHERE { ?s rdfs:label ?label }");

    assert_eq!(session.execute().await, Some(1));
    let snapshot = session.wait_settled().await;

    assert_eq!(snapshot.state, RunState::Settled);
    assert_eq!(snapshot.columns, vec!["s", "label"]);
    assert_eq!(snapshot.row_count, 3);
    assert!(!snapshot.possibly_incomplete);
    assert_eq!(snapshot.error_message, "");

    let rows = session.rows();
    assert_eq!(rows[0].get("label"), Some(&Term::lang_literal("A", "en")));
    assert!(rows[1].get("label").is_none());
}

#[tokio::test]
async fn ask_over_http_yields_single_result_row() {
    let addr = serve_fixed(
        "application/sparql-results+json",
        r#"{ "head": {}, "boolean": false }"#,
    )
    .await;
    let session = session_for(&[sparql_source("local", format!("http://{}/sparql", addr), true)]);
    session.set_query_text("ASK { ?s ?p ?o }");

    session.execute().await;
    session.wait_settled().await;

    assert_eq!(session.columns(), vec!["result"]);
    assert_eq!(session.rows().len(), 1);
    assert_eq!(session.rows()[0].get("result"), Some(&Term::boolean(false)));
}

#[tokio::test]
async fn streamed_graph_can_be_cancelled_midway() {
    let (addr, chunks) = serve_streaming("application/n-triples").await;
    let session = session_for(&[sparql_source("local", format!("http://{}/sparql", addr), true)]);
    session.set_query_text("CONSTRUCT WHERE { ?s ?p ?o }");

    session.execute().await;
    chunks
        .send(Bytes::from_static(
            b"<http://ex.org/s0> <http://ex.org/p> \"0\" .\n<http://ex.org/s1> <http://ex.org/p> \"1\" .\n",
        ))
        .await
        .expect("chunk");
    until(&session, |s| s.row_count() == 2).await;

    assert_eq!(session.columns(), vec!["subject", "predicate", "object", "graph"]);
    assert!(session.cancel());

    let _ = chunks
        .send(Bytes::from_static(b"<http://ex.org/s2> <http://ex.org/p> \"2\" .\n"))
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(session.state(), RunState::Settled);
    assert_eq!(session.row_count(), 2);
    assert!(session.possibly_incomplete());
    assert_eq!(session.error_message(), "");
}

#[tokio::test]
async fn select_rows_show_up_while_the_response_is_still_open() {
    let (addr, chunks) = serve_streaming("application/sparql-results+json").await;
    let session = session_for(&[sparql_source("local", format!("http://{}/sparql", addr), true)]);
    session.set_query_text("SELECT ?s WHERE { ?s ?p ?o }");

    chunks
        .send(Bytes::from_static(
            br#"{"head":{"vars":["s"]},"results":{"bindings":[{"s":{"type":"uri","value":"http://ex.org/0"}},{"s":{"type":"uri","value":"http://ex.org/1"}}"#,
        ))
        .await
        .expect("chunk");
    session.execute().await;
    until(&session, |s| s.row_count() == 2).await;

    assert_eq!(session.state(), RunState::Running);
    assert_eq!(session.columns(), vec!["s"]);

    chunks
        .send(Bytes::from_static(
            br#",{"s":{"type":"uri","value":"http://ex.org/2"}}]}}"#,
        ))
        .await
        .expect("chunk");
    drop(chunks);
    let snapshot = session.wait_settled().await;

    assert_eq!(snapshot.row_count, 3);
    assert!(!snapshot.possibly_incomplete);
    assert_eq!(snapshot.error_message, "");
}

#[tokio::test]
async fn unreachable_endpoint_settles_with_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let session = session_for(&[sparql_source("gone", format!("http://{}/sparql", addr), true)]);
    session.set_query_text("SELECT * WHERE { ?s ?p ?o }");

    session.execute().await;

    assert_eq!(session.state(), RunState::Settled);
    assert!(session.possibly_incomplete());
    assert!(session.error_message().contains("endpoint unreachable"));
    assert_eq!(session.row_count(), 0);
}

#[tokio::test]
async fn fanout_selection_is_reported_not_raised() {
    let session = session_for(&[
        sparql_source("a", "http://a.example/sparql".into(), true),
        sparql_source("b", "http://b.example/sparql".into(), true),
    ]);

    assert_eq!(session.targets().len(), 2);
    session.execute().await;

    assert_eq!(session.state(), RunState::Settled);
    assert!(session.possibly_incomplete());
    assert!(!session.error_message().is_empty());
}

#[tokio::test]
async fn replayed_example_runs_against_its_sources() {
    let addr = serve_fixed(
        "application/sparql-results+json",
        r#"{ "head": { "vars": ["n"] }, "results": { "bindings": [ { "n": { "type": "literal", "value": "42" } } ] } }"#,
    )
    .await;
    let session = session_for(&[
        sparql_source("other", "http://other.example/sparql".into(), true),
        sparql_source("local", format!("http://{}/sparql", addr), false),
    ]);

    session.replay("SELECT ?n WHERE { }", &["local"]);
    assert_eq!(session.query_text(), "SELECT ?n WHERE { }");
    assert_eq!(session.targets().len(), 1);

    session.execute().await;
    let snapshot = session.wait_settled().await;
    assert_eq!(snapshot.row_count, 1);
    assert_eq!(snapshot.progress_text, format!("1 result in {:.1}s.", snapshot.elapsed.as_secs_f64()));
}

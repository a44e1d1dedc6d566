//! CLI command logic against a scripted transport

use eswrap::search::{read_body, run_search, SearchArgs};
use eswrap::{print_count, register_scripts, Config};
use eswrap_client::mock::MockTransport;
use eswrap_client::EsClient;
use eswrap_core::SortSchema;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

fn client() -> (EsClient, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    (EsClient::with_transport(mock.clone()), mock)
}

fn page(hits: Value) -> Value {
    json!({"took": 1, "timed_out": false, "hits": {"hits": hits}})
}

fn output_lines(out: Vec<u8>) -> Vec<Value> {
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn sorted_args(pages: usize, sort_schema: Option<SortSchema>) -> SearchArgs {
    SearchArgs {
        index: "events".to_string(),
        body: json!({"query": {"match_all": {}}, "sort": [{"ts": "asc"}, {"_id": "asc"}]}),
        size: 2,
        sort_schema,
        pages,
    }
}

#[tokio::test]
async fn test_search_follows_cursor_until_short_page() {
    let (client, mock) = client();
    mock.respond_json(
        200,
        &page(json!([
            {"_index": "events", "_id": "a", "_source": {"n": 1}, "sort": [1676432653945685122_i64, "a"]},
            {"_index": "events", "_id": "b", "_source": {"n": 2}, "sort": [1676432653945685122_i64, "b"]}
        ])),
    );
    mock.respond_json(
        200,
        &page(json!([
            {"_index": "events", "_id": "c", "_source": {"n": 3}, "sort": [1676432653945685199_i64, "c"]}
        ])),
    );

    let mut out = Vec::new();
    let written = run_search(&client, &sorted_args(5, None), &mut out)
        .await
        .unwrap();
    assert_eq!(written, 3);

    let lines = output_lines(out);
    let ids: Vec<&str> = lines.iter().map(|l| l["_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(lines[2]["sort"][0].as_i64(), Some(1_676_432_653_945_685_199));

    // short second page ends the run
    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    let second = String::from_utf8(requests[1].body().unwrap().to_vec()).unwrap();
    assert!(second.contains(r#""search_after":[1676432653945685122,"b"]"#), "{second}");
}

#[tokio::test]
async fn test_search_with_sort_schema() {
    let (client, mock) = client();
    mock.respond_json(
        200,
        &page(json!([
            {"_index": "events", "_id": "a", "sort": [10, "a"]},
            {"_index": "events", "_id": "b", "sort": [11, "b"]}
        ])),
    );
    mock.respond_json(200, &page(json!([])));

    let mut out = Vec::new();
    let written = run_search(
        &client,
        &sorted_args(3, Some(SortSchema::parse("is"))),
        &mut out,
    )
    .await
    .unwrap();
    assert_eq!(written, 2);
    assert_eq!(
        mock.requests()[1].body_json().unwrap()["search_after"],
        json!([11, "b"])
    );
}

#[tokio::test]
async fn test_paging_requires_sort() {
    let (client, mock) = client();
    let mut args = sorted_args(2, None);
    args.body = json!({"query": {"match_all": {}}});

    let err = run_search(&client, &args, &mut Vec::new()).await.unwrap_err();
    assert!(err.to_string().contains("requires a \"sort\""));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_search_error_is_reported() {
    let (client, mock) = client();
    mock.respond_json(404, &json!({"error": {"type": "index_not_found_exception"}, "status": 404}));

    let err = run_search(&client, &sorted_args(1, None), &mut Vec::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Search on 'events' failed"));
}

#[test]
fn test_read_body_default_and_file() {
    assert_eq!(read_body(None).unwrap(), json!({"query": {"match_all": {}}}));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"query": {{"term": {{"level": "error"}}}}}}"#).unwrap();
    assert_eq!(
        read_body(Some(file.path())).unwrap(),
        json!({"query": {"term": {"level": "error"}}})
    );

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, "[1, 2]").unwrap();
    assert!(read_body(Some(bad.path())).is_err());
}

#[tokio::test]
async fn test_count_prints_number() {
    let (client, mock) = client();
    mock.respond_json(200, &json!({"count": 12}));

    let mut out = Vec::new();
    print_count(&client, "events", &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "12\n");
}

#[tokio::test]
async fn test_register_scripts_from_config() {
    let (client, mock) = client();
    mock.respond_json(200, &json!({"acknowledged": true}));

    let config = Config::from_toml_str(
        r#"
        [scripts.stored]
        bump = "ctx._source.n += 1"
    "#,
    )
    .unwrap();

    let mut out = Vec::new();
    register_scripts(&client, &config, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Registered 1/1 stored scripts\n");
    assert_eq!(mock.last_request().unwrap().path(), "/_scripts/bump");
}

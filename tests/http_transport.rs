use engine_client::{
    ApiErrorKind, Client, ContainerOutput, StreamTag,
    api::LogsOptions,
    mock::{MockReply, MockScript, MockServer, frame},
};
use http::{Method, StatusCode};

fn script() -> MockScript {
    MockScript::new()
        .route(Method::GET, "/_ping", MockReply::status(StatusCode::OK).chunk("OK"))
        .container("app", false)
        .route(
            Method::GET,
            "/containers/app/logs",
            MockReply::status(StatusCode::OK)
                .chunk(frame(StreamTag::Stdout, b"out\n"))
                .chunk(frame(StreamTag::Stderr, b"err\n")),
        )
        .container("live", false)
        .route(
            Method::GET,
            "/containers/live/logs",
            MockReply::status(StatusCode::OK)
                .chunk(frame(StreamTag::Stdout, b"tick\n"))
                .hold_open(),
        )
        .route(
            Method::POST,
            "/images/create",
            MockReply::error(
                StatusCode::NOT_FOUND,
                "pull access denied for nope, repository does not exist or may require 'docker login': not found: does not exist or no pull access",
            ),
        )
}

#[tokio::test]
async fn tcp_round_trip_with_multiplexed_logs() -> engine_client::Result<()> {
    let server = MockServer::start_tcp(script()).await?;
    let client = Client::connect(server.endpoint()).await?;

    assert!(client.ping().await?);

    let output = client.logs("app", LogsOptions::default()).await?;
    assert_eq!(&output.into_bytes().await?[..], b"out\nerr\n");

    assert_eq!(
        server.requests(),
        [
            "GET /v1.26/_ping",
            "GET /v1.26/containers/app/json",
            "GET /v1.26/containers/app/logs?stdout=true&stderr=true&timestamps=false&follow=false&tail=all",
        ]
    );

    server.shutdown().await;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn unix_socket_follow_can_stop_early() -> engine_client::Result<()> {
    let dir = tempfile::tempdir()?;
    let server = MockServer::start_unix(dir.path().join("engine.sock"), script()).await?;
    let client = Client::connect(server.endpoint()).await?;

    let options = LogsOptions {
        follow: true,
        ..Default::default()
    };
    let ContainerOutput::Multiplexed(mut frames) = client.logs("live", options).await? else {
        panic!("expected a multiplexed stream");
    };
    let first = frames.try_next().await?.expect("first frame");
    assert_eq!(first.tag, StreamTag::Stdout);
    assert_eq!(&first.payload[..], b"tick\n");
    drop(frames);

    // The connection is free again: further calls still work.
    assert!(client.ping().await?);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn http_error_bodies_are_mapped() -> engine_client::Result<()> {
    let server = MockServer::start_tcp(script()).await?;
    let client = Client::connect(server.endpoint()).await?;

    let err = client.pull("nope", None).await.expect_err("must fail");
    let api = err.api().expect("api error");
    assert_eq!(api.status(), StatusCode::NOT_FOUND);
    assert_eq!(api.kind(), ApiErrorKind::ImageNotFound);

    server.shutdown().await;
    Ok(())
}

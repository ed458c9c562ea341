mod common;

use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use common::{HOST, fixture, soap_envelope};
use std::net::{IpAddr, SocketAddr};
use tower::ServiceExt;
use xbmediaserver::connectionmanager::CONNECTION_MANAGER_URN;
use xbmediaserver::content_handler::CONTENT_DIRECTORY_URN;
use xbmediaserver::{MediaServer, MediaServerOptions};
use xbupnp::TEXT_XML_UTF8;

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn soap_request(service: &str, urn: &str, action: &str, args: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/ctl/{}", service))
        .header(header::HOST, HOST)
        .header("SOAPACTION", format!("\"{}#{}\"", urn, action))
        .body(Body::from(soap_envelope(urn, action, args)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, HOST)
        .body(Body::empty())
        .unwrap()
}

fn media_server(options: MediaServerOptions) -> (common::Fixture, MediaServer) {
    let fx = fixture();
    let server = MediaServer::new(fx.library.clone(), options);
    (fx, server)
}

#[tokio::test]
async fn test_descriptions() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let response = server.router().oneshot(get("/rootDesc.xml")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_XML_UTF8);
    let xml = body_text(response).await;
    assert!(xml.contains("urn:schemas-upnp-org:device:MediaServer:1"));

    let response = server
        .router()
        .oneshot(get("/scpd/ContentDirectory.xml"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<name>Browse</name>"));

    let response = server.router().oneshot(get("/scpd/AVTransport.xml")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_browse_over_soap() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let request = soap_request(
        "ContentDirectory",
        CONTENT_DIRECTORY_URN,
        "Browse",
        &[
            ("ObjectID", "0"),
            ("BrowseFlag", "BrowseDirectChildren"),
            ("Filter", "*"),
            ("StartingIndex", "0"),
            ("RequestedCount", "0"),
            ("SortCriteria", ""),
        ],
    );
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_text(response).await;
    assert!(xml.contains("BrowseResponse"));
    assert!(xml.contains("<NumberReturned>7</NumberReturned>"));
    assert!(xml.contains("<TotalMatches>7</TotalMatches>"));
    // le DIDL-Lite est transporté échappé
    assert!(xml.contains("&lt;DIDL-Lite"));
}

#[tokio::test]
async fn test_faults_use_http_500() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let request = soap_request(
        "ContentDirectory",
        CONTENT_DIRECTORY_URN,
        "Browse",
        &[("ObjectID", "0"), ("BrowseFlag", "BrowseMetadata")],
    );
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_XML_UTF8);
    assert!(body_text(response).await.contains("<errorCode>600</errorCode>"));

    let request = soap_request("ContentDirectory", CONTENT_DIRECTORY_URN, "DestroyObject", &[]);
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("<errorCode>401</errorCode>"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/ctl/ContentDirectory")
        .body(Body::from("not xml"))
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("<errorCode>401</errorCode>"));
}

#[tokio::test]
async fn test_connection_manager_over_soap() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let request = soap_request(
        "ConnectionManager",
        CONNECTION_MANAGER_URN,
        "GetCurrentConnectionInfo",
        &[("ConnectionID", "0")],
    );
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<Direction>Output</Direction>"));

    let request = soap_request(
        "ConnectionManager",
        CONNECTION_MANAGER_URN,
        "GetCurrentConnectionInfo",
        &[("ConnectionID", "9")],
    );
    let response = server.router().oneshot(request).await.unwrap();
    assert!(body_text(response).await.contains("<errorCode>706</errorCode>"));
}

#[tokio::test]
async fn test_event_subscription() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let subscribe = Method::from_bytes(b"SUBSCRIBE").unwrap();
    let request = Request::builder()
        .method(subscribe)
        .uri("/evt/ContentDirectory")
        .header("CALLBACK", "<http://192.168.1.30:4000/>")
        .header("NT", "upnp:event")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sid = response.headers()["sid"].to_str().unwrap();
    assert!(sid.starts_with("uuid:"));
    assert_eq!(response.headers()["timeout"], "Second-1800");

    let request = Request::builder()
        .method(Method::from_bytes(b"UNSUBSCRIBE").unwrap())
        .uri("/evt/ContentDirectory")
        .header("SID", "uuid:1234")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resource_serving() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let response = server.router().oneshot(get("/res?scene=vrsite-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["transfermode.dlna.org"], "Streaming");
    assert!(
        response.headers()["contentfeatures.dlna.org"]
            .to_str()
            .unwrap()
            .contains("DLNA.ORG_OP=01")
    );
    assert_eq!(body_text(response).await, "0123456789");

    let request = Request::builder()
        .uri("/res?file=10")
        .header(header::RANGE, "bytes=2-5")
        .body(Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_text(response).await, "2345");

    let response = server.router().oneshot(get("/res?scene=unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server.router().oneshot(get("/res?file=11")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .router()
        .oneshot(get("/res?scene=vrsite-1&transcode=web"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_folder_resource_stays_inside_root() {
    let fx = fixture();
    let options = MediaServerOptions {
        folders_root: Some(fx.dir.path().to_path_buf()),
        ..Default::default()
    };
    let server = MediaServer::new(fx.library.clone(), options);

    let response = server.router().oneshot(get("/res?path=%2Floose.mp4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = server
        .router()
        .oneshot(get("/res?path=%2F..%2Fetc%2Fpasswd"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_icon_redirects_to_cover() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let response = server
        .router()
        .oneshot(get("/icon?scene=vrsite-1&c=jpeg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://cdn.example.org/covers/1.jpg"
    );

    // sans jaquette, l'icône du device
    let response = server.router().oneshot(get("/icon?scene=vrsite-2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let response = server.router().oneshot(get("/icon?file=10&c=jpeg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for uri in ["/icon?scene=unknown", "/icon?file=11", "/icon?c=jpeg"] {
        let response = server.router().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_device_icons() {
    let (_fx, server) = media_server(MediaServerOptions::default());

    let response = server.router().oneshot(get("/icons/48.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));

    let response = server.router().oneshot(get("/icons/64.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_allowed_ips() {
    let allowed: IpAddr = "192.168.1.30".parse().unwrap();
    let (_fx, server) = media_server(MediaServerOptions {
        allowed_ips: vec![allowed],
        ..Default::default()
    });

    // sans adresse de connexion, la requête est refusée
    let response = server.router().oneshot(get("/rootDesc.xml")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut request = get("/rootDesc.xml");
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 31], 5000))));
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // une adresse IPv4 vue en IPv6 mappée reste reconnue
    let mut request = get("/rootDesc.xml");
    let mapped: SocketAddr = "[::ffff:192.168.1.30]:5000".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(mapped));
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ssdp_device_points_to_description() {
    let (_fx, server) = media_server(MediaServerOptions {
        udn: "abcd".to_string(),
        ..Default::default()
    });
    let device = server.ssdp_device("http://192.168.1.20:9999");
    assert_eq!(device.location, "http://192.168.1.20:9999/rootDesc.xml");
    assert!(
        device
            .notification_types
            .iter()
            .any(|nt| nt == CONTENT_DIRECTORY_URN)
    );
}

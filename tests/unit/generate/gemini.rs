use super::*;
use crate::{
    model::items::Role, pipeline::coordinator::ReferenceSet, render::surface::Raster,
};

fn composite(role: Role) -> crate::encode::png::Composite {
    let raster = Raster {
        width: 1,
        height: 1,
        data: vec![0, 0, 0, 255],
    };
    crate::encode::png::Composite::from_raster(role, &raster).unwrap()
}

#[test]
fn enhance_body_is_a_single_text_part() {
    let body = enhance_request("a chase", &["bike".to_string()]);
    let json = serde_json::to_value(&body).unwrap();
    let parts = json["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 1);
    assert!(parts[0]["text"].as_str().unwrap().contains("bike"));
    assert!(json.get("generationConfig").is_none());
}

#[test]
fn render_body_orders_parts_and_omits_absent_roles() {
    let refs = ReferenceSet {
        layout: Some(composite(Role::Layout)),
        props: Some(composite(Role::Props)),
        style: None,
    };
    let req = GenerationRequest::new("scene", &refs, &Config::default());
    let json = serde_json::to_value(render_request(&req)).unwrap();

    let parts = json["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert!(parts[0]["text"].as_str().unwrap().ends_with("SCENE DESCRIPTION: scene"));
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(
        parts[1]["inlineData"]["data"].as_str().unwrap(),
        refs.layout.as_ref().unwrap().image.base64_payload()
    );
    assert_eq!(
        parts[2]["inlineData"]["data"].as_str().unwrap(),
        refs.props.as_ref().unwrap().image.base64_payload()
    );
    assert!(parts[1].get("text").is_none());

    let image_config = &json["generationConfig"]["imageConfig"];
    assert_eq!(image_config["aspectRatio"], "16:9");
    assert_eq!(image_config["imageSize"], "2K");
}

#[test]
fn text_response_joins_and_trims_parts() {
    let body = br#"{"candidates":[{"content":{"parts":[{"text":"  A wide "},{"text":"shot. "}]}}]}"#;
    assert_eq!(parse_text_response(body).unwrap(), "A wide shot.");
    assert_eq!(parse_text_response(b"{}").unwrap(), "");
}

#[test]
fn image_response_returns_first_inline_image() {
    let payload = STANDARD.encode(b"\x89PNGfake");
    let body = format!(
        r#"{{"candidates":[{{"content":{{"parts":[{{"text":"here"}},{{"inlineData":{{"mimeType":"image/png","data":"{payload}"}}}}]}},"finishReason":"STOP"}}]}}"#
    );
    let img = parse_image_response(body.as_bytes()).unwrap();
    assert_eq!(img.media_type, "image/png");
    assert_eq!(img.as_bytes(), b"\x89PNGfake");
}

#[test]
fn missing_image_is_a_refusal() {
    let body = br#"{"candidates":[{"content":{"parts":[{"text":"I can't draw that."}]},"finishReason":"IMAGE_SAFETY"}]}"#;
    assert_eq!(
        parse_image_response(body).unwrap_err(),
        GenerationError::Refused("IMAGE_SAFETY".to_string())
    );

    let blocked = br#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
    assert_eq!(
        parse_image_response(blocked).unwrap_err(),
        GenerationError::Refused("SAFETY".to_string())
    );
}

#[test]
fn malformed_response_is_a_service_error() {
    assert!(matches!(
        parse_image_response(b"<html>"),
        Err(GenerationError::Service { status: 200, .. })
    ));
}

#[test]
fn auth_failures_are_credential_errors() {
    let body = br#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
    assert_eq!(
        classify_failure(403, body),
        GenerationError::Credential("API key not valid".to_string())
    );

    let not_found = br#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
    assert!(classify_failure(404, not_found).is_credential());
}

#[test]
fn other_failures_keep_status_and_message() {
    let body = br#"{"error":{"code":500,"message":"internal","status":"INTERNAL"}}"#;
    assert_eq!(
        classify_failure(500, body),
        GenerationError::Service {
            status: 500,
            message: "internal".to_string()
        }
    );
    assert_eq!(
        classify_failure(502, b"bad gateway\n"),
        GenerationError::Service {
            status: 502,
            message: "bad gateway".to_string()
        }
    );
}

#[test]
fn fixed_credentials_are_returned() {
    let creds = EnvCredentials::with_key("STORYSHEET_TEST_UNSET_KEY_VAR", "k-123");
    assert_eq!(creds.current().unwrap(), "k-123");
}

#[test]
fn missing_credentials_name_the_variable() {
    let creds = EnvCredentials::new("STORYSHEET_TEST_UNSET_KEY_VAR");
    let err = creds.current().unwrap_err();
    assert!(err.is_credential());
    assert!(err.to_string().contains("STORYSHEET_TEST_UNSET_KEY_VAR"));
    assert!(creds.reauthenticate().unwrap_err().is_credential());
}

#[test]
fn endpoint_joins_base_and_model() {
    let cfg = Config {
        api_base: "https://example.test/v1beta/".to_string(),
        ..Config::default()
    };
    let client = GeminiClient::new(
        &cfg,
        Arc::new(EnvCredentials::with_key("UNUSED", "k")),
    )
    .unwrap();
    assert_eq!(
        client.endpoint("m-1"),
        "https://example.test/v1beta/models/m-1:generateContent"
    );
}

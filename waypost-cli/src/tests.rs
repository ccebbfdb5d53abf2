//! Unit tests covering argument parsing, configuration conversion, and
//! command output rendering.

use super::*;
use std::time::Duration;

use geo::Coord;
use rstest::rstest;
use serde_json::{Value, json};
use waypost_core::IsochroneLimit;
use waypost_providers::ProviderError;
use waypost_providers::graphhopper::{GraphHopper, GraphHopperConfig, OutArray};
use waypost_providers::transport::TransportError;
use waypost_providers::transport::test_support::RecordingTransport;

use super::commands::{
    DirectionsArgs, DirectionsConfig, IsochronesArgs, IsochronesConfig, MatrixArgs, MatrixConfig,
    directions_config_from_layers, execute_directions, execute_isochrones, execute_matrix,
    parse_lat_lon,
};

fn sample_points() -> Vec<Coord<f64>> {
    vec![
        Coord { x: 8.680916, y: 49.415776 },
        Coord { x: 8.688641, y: 49.420577 },
    ]
}

fn provider_for_tests() -> GraphHopperConfig {
    GraphHopperConfig::default().with_api_key("test-key")
}

fn client_with(transport: &RecordingTransport) -> GraphHopper<RecordingTransport> {
    GraphHopper::with_transport(provider_for_tests(), transport.clone())
}

fn directions_config(alternatives: bool, json: bool) -> DirectionsConfig {
    DirectionsConfig {
        points: sample_points(),
        profile: "car".to_string(),
        provider: provider_for_tests(),
        alternatives,
        json,
    }
}

/// Three points of the classic polyline test vector, precision five.
const ENCODED_GEOMETRY: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

fn directions_payload() -> Value {
    json!({
        "paths": [{
            "points": ENCODED_GEOMETRY,
            "time": 1_274_000.0,
            "distance": 23_455.5,
        }]
    })
}

#[rstest]
#[case("48.23424,8.34234", Coord { x: 8.34234, y: 48.23424 })]
#[case(" 52.5 , 13.4 ", Coord { x: 13.4, y: 52.5 })]
#[case("-33.865368,151.209095", Coord { x: 151.209095, y: -33.865368 })]
fn parsing_points_accepts_lat_lng_pairs(#[case] text: &str, #[case] expected: Coord<f64>) {
    let parsed = parse_lat_lon(text).expect("point should parse");
    assert_eq!(parsed, expected);
}

#[rstest]
#[case::no_comma("48.23424")]
#[case::word("here")]
#[case::missing_lng("48.23424,")]
#[case::missing_lat(",8.34234")]
#[case::three_parts("48.2,8.3,100")]
fn parsing_points_rejects_malformed_input(#[case] text: &str) {
    let err = parse_lat_lon(text).expect_err("malformed point should error");
    match err {
        CliError::InvalidPoint { text: reported } => assert_eq!(reported, text),
        other => panic!("expected InvalidPoint, found {other:?}"),
    }
}

#[rstest]
fn parsing_directions_collects_points_and_flags() {
    let cli = Cli::try_parse_from([
        "waypost",
        "directions",
        "49.415776,8.680916",
        "49.420577,8.688641",
        "--api-key",
        "test-key",
        "--profile",
        "bike",
        "--json",
    ])
    .expect("arguments should parse");

    match cli.command {
        Command::Directions(args) => {
            assert_eq!(args.points.len(), 2);
            assert_eq!(args.api_key.as_deref(), Some("test-key"));
            assert_eq!(args.profile.as_deref(), Some("bike"));
            assert!(!args.alternatives);
            assert!(args.json);
        }
        other => panic!("expected directions command, found {other:?}"),
    }
}

#[rstest]
fn parsing_directions_accepts_southern_hemisphere_points() {
    let cli = Cli::try_parse_from([
        "waypost",
        "directions",
        "-33.865368,151.209095",
        "-33.856159,151.215256",
        "--api-key",
        "test-key",
    ])
    .expect("negative latitudes should parse as points");

    match cli.command {
        Command::Directions(args) => {
            assert_eq!(args.points[0], "-33.865368,151.209095");
        }
        other => panic!("expected directions command, found {other:?}"),
    }
}

#[rstest]
fn parsing_matrix_splits_index_lists() {
    let cli = Cli::try_parse_from([
        "waypost",
        "matrix",
        "49.415776,8.680916",
        "49.420577,8.688641",
        "49.445776,8.780916",
        "--api-key",
        "test-key",
        "--sources",
        "0,2",
        "--times",
    ])
    .expect("arguments should parse");

    match cli.command {
        Command::Matrix(args) => {
            assert_eq!(args.sources, Some(vec![0, 2]));
            assert!(args.destinations.is_none());
            assert!(args.times);
            assert!(!args.distances);
        }
        other => panic!("expected matrix command, found {other:?}"),
    }
}

#[rstest]
fn parsing_isochrones_reads_limit_flags() {
    let cli = Cli::try_parse_from([
        "waypost",
        "isochrones",
        "48.23424,8.34234",
        "--api-key",
        "test-key",
        "--time-limit",
        "900",
        "--buckets",
        "3",
        "--reverse-flow",
    ])
    .expect("arguments should parse");

    match cli.command {
        Command::Isochrones(args) => {
            assert_eq!(args.center.as_deref(), Some("48.23424,8.34234"));
            assert_eq!(args.time_limit, Some(900));
            assert_eq!(args.buckets, Some(3));
            assert!(args.reverse_flow);
        }
        other => panic!("expected isochrones command, found {other:?}"),
    }
}

#[rstest]
fn converting_directions_without_api_key_errors() {
    let args = DirectionsArgs {
        points: vec!["49.415776,8.680916".to_string(), "49.420577,8.688641".to_string()],
        ..DirectionsArgs::default()
    };

    let err = DirectionsConfig::try_from(args).expect_err("missing key should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_API_KEY);
            assert_eq!(env, ENV_DIRECTIONS_API_KEY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_isochrones_without_center_errors() {
    let args = IsochronesArgs {
        api_key: Some("test-key".to_string()),
        ..IsochronesArgs::default()
    };

    let err = IsochronesConfig::try_from(args).expect_err("missing centre should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_CENTER);
            assert_eq!(env, ENV_ISOCHRONES_CENTER);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_matrix_without_api_key_errors() {
    let args = MatrixArgs {
        points: vec!["49.415776,8.680916".to_string(), "49.420577,8.688641".to_string()],
        ..MatrixArgs::default()
    };

    let err = MatrixConfig::try_from(args).expect_err("missing key should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_API_KEY);
            assert_eq!(env, ENV_MATRIX_API_KEY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_directions_with_one_point_errors() {
    let args = DirectionsArgs {
        points: vec!["49.415776,8.680916".to_string()],
        api_key: Some("test-key".to_string()),
        ..DirectionsArgs::default()
    };

    let err = DirectionsConfig::try_from(args).expect_err("one point should error");
    match err {
        CliError::TooFewPoints {
            command,
            needed,
            got,
        } => {
            assert_eq!(command, "directions");
            assert_eq!(needed, 2);
            assert_eq!(got, 1);
        }
        other => panic!("expected TooFewPoints, found {other:?}"),
    }
}

#[rstest]
fn converting_directions_surfaces_malformed_points() {
    let args = DirectionsArgs {
        points: vec!["not-a-point".to_string(), "49.420577,8.688641".to_string()],
        api_key: Some("test-key".to_string()),
        ..DirectionsArgs::default()
    };

    let err = DirectionsConfig::try_from(args).expect_err("malformed point should error");
    match err {
        CliError::InvalidPoint { text } => assert_eq!(text, "not-a-point"),
        other => panic!("expected InvalidPoint, found {other:?}"),
    }
}

#[rstest]
fn converting_directions_builds_the_provider_config() {
    let args = DirectionsArgs {
        points: vec!["49.415776,8.680916".to_string(), "49.420577,8.688641".to_string()],
        api_key: Some("test-key".to_string()),
        base_url: Some("http://localhost:8989".to_string()),
        ..DirectionsArgs::default()
    };

    let config = DirectionsConfig::try_from(args).expect("config should build");
    assert_eq!(config.provider.base_url, "http://localhost:8989");
    assert_eq!(config.provider.api_key.as_deref(), Some("test-key"));
    assert_eq!(config.profile, "car");
    assert_eq!(config.points, sample_points());
    assert!(!config.json);
}

#[rstest]
#[case::default_reach(None, None, IsochroneLimit::Time(Duration::from_secs(600)))]
#[case::time(Some(900), None, IsochroneLimit::Time(Duration::from_secs(900)))]
#[case::distance(None, Some(5000), IsochroneLimit::Distance(5000))]
fn converting_isochrones_resolves_the_limit(
    #[case] time_limit: Option<u64>,
    #[case] distance_limit: Option<u64>,
    #[case] expected: IsochroneLimit,
) {
    let args = IsochronesArgs {
        center: Some("48.23424,8.34234".to_string()),
        api_key: Some("test-key".to_string()),
        time_limit,
        distance_limit,
        ..IsochronesArgs::default()
    };

    let config = IsochronesConfig::try_from(args).expect("config should build");
    assert_eq!(config.limit, expected);
    assert_eq!(config.center, Coord { x: 8.34234, y: 48.23424 });
}

#[rstest]
fn converting_isochrones_with_both_limits_errors() {
    let args = IsochronesArgs {
        center: Some("48.23424,8.34234".to_string()),
        api_key: Some("test-key".to_string()),
        time_limit: Some(600),
        distance_limit: Some(5000),
        ..IsochronesArgs::default()
    };

    let err = IsochronesConfig::try_from(args).expect_err("both limits should error");
    match err {
        CliError::ConflictingLimits => {}
        other => panic!("expected ConflictingLimits, found {other:?}"),
    }
}

#[rstest]
#[case::both_by_default(false, false, vec![OutArray::Times, OutArray::Distances])]
#[case::times_only(true, false, vec![OutArray::Times])]
#[case::distances_only(false, true, vec![OutArray::Distances])]
fn converting_matrix_resolves_out_arrays(
    #[case] times: bool,
    #[case] distances: bool,
    #[case] expected: Vec<OutArray>,
) {
    let args = MatrixArgs {
        points: vec!["49.415776,8.680916".to_string(), "49.420577,8.688641".to_string()],
        api_key: Some("test-key".to_string()),
        times,
        distances,
        ..MatrixArgs::default()
    };

    let config = MatrixConfig::try_from(args).expect("config should build");
    assert_eq!(config.out_arrays, expected);
}

#[rstest]
fn directions_render_a_route_summary() {
    let transport = RecordingTransport::with_response(directions_payload());
    let client = client_with(&transport);
    let mut output = Vec::new();

    execute_directions(&client, &directions_config(false, false), &mut output)
        .expect("command should succeed");

    let rendered = String::from_utf8(output).expect("output utf-8");
    assert_eq!(rendered, "route: 23455 m in 1274 s (3 points)\n");
    let call = transport.single_call();
    assert_eq!(call.url.path(), "/api/1/route");
    assert_eq!(call.url.query(), Some("key=test-key"));
}

#[rstest]
fn directions_json_prints_the_raw_response() {
    let transport = RecordingTransport::with_response(directions_payload());
    let client = client_with(&transport);
    let mut output = Vec::new();

    execute_directions(&client, &directions_config(false, true), &mut output)
        .expect("command should succeed");

    let rendered = String::from_utf8(output).expect("output utf-8");
    let expected = serde_json::to_string_pretty(&directions_payload()).expect("serialise payload");
    assert_eq!(rendered, format!("{expected}\n"));
}

#[rstest]
fn directions_alternatives_list_every_route() {
    let transport = RecordingTransport::with_response(json!({
        "paths": [
            {"points": ENCODED_GEOMETRY, "time": 1_274_000.0, "distance": 23_455.5},
            {"points": ENCODED_GEOMETRY, "time": 1_391_000.0, "distance": 24_918.2},
        ]
    }));
    let client = client_with(&transport);
    let mut output = Vec::new();

    execute_directions(&client, &directions_config(true, false), &mut output)
        .expect("command should succeed");

    let rendered = String::from_utf8(output).expect("output utf-8");
    assert_eq!(
        rendered,
        "route 1: 23455 m in 1274 s (3 points)\nroute 2: 24918 m in 1391 s (3 points)\n"
    );
    let body = transport.single_call().body.expect("directions posts a body");
    assert_eq!(body.get("algorithm"), Some(&json!("alternative_route")));
}

#[rstest]
fn isochrones_render_one_line_per_ring() {
    let transport = RecordingTransport::with_response(json!({
        "polygons": [
            {"geometry": {"type": "Polygon", "coordinates": [[[8.32, 48.22], [8.36, 48.25], [8.32, 48.22]]]}},
            {"geometry": {"type": "Polygon", "coordinates": [[[8.30, 48.20], [8.40, 48.28], [8.30, 48.20]]]}},
        ]
    }));
    let client = client_with(&transport);
    let config = IsochronesConfig {
        center: Coord { x: 8.34234, y: 48.23424 },
        profile: "car".to_string(),
        provider: provider_for_tests(),
        limit: IsochroneLimit::Time(Duration::from_secs(600)),
        buckets: Some(2),
        reverse_flow: false,
        json: false,
    };
    let mut output = Vec::new();

    execute_isochrones(&client, &config, &mut output).expect("command should succeed");

    let rendered = String::from_utf8(output).expect("output utf-8");
    assert_eq!(
        rendered,
        "isochrone 1: within 300 s (3 ring points)\nisochrone 2: within 600 s (3 ring points)\n"
    );
    assert_eq!(
        transport.single_call().url.as_str(),
        "https://graphhopper.com/api/1/isochrone?point=48.23424%2C8.34234&profile=car\
         &time_limit=600&buckets=2&type=json&key=test-key"
    );
}

#[rstest]
fn matrix_renders_dashes_for_unroutable_pairs() {
    let transport = RecordingTransport::with_response(json!({
        "times": [[0.0, 105.4], [null, 0.0]],
        "distances": [[0.0, 1886.9], [null, 0.0]],
    }));
    let client = client_with(&transport);
    let config = MatrixConfig {
        points: sample_points(),
        profile: "car".to_string(),
        provider: provider_for_tests(),
        sources: None,
        destinations: None,
        out_arrays: vec![OutArray::Times, OutArray::Distances],
        json: false,
    };
    let mut output = Vec::new();

    execute_matrix(&client, &config, &mut output).expect("command should succeed");

    let rendered = String::from_utf8(output).expect("output utf-8");
    assert_eq!(
        rendered,
        "durations (s):\n  0 105\n  - 0\ndistances (m):\n  0 1886\n  - 0\n"
    );
    assert_eq!(
        transport.single_call().url.as_str(),
        "https://graphhopper.com/api/1/matrix?point=49.415776%2C8.680916\
         &point=49.420577%2C8.688641&profile=car&out_array=times&out_array=distances\
         &key=test-key"
    );
}

#[rstest]
fn provider_failures_surface_as_cli_errors() {
    let transport = RecordingTransport::with_error(TransportError::Network {
        url: "https://graphhopper.com/api/1/route?key=test-key".to_string(),
        message: "connection refused".to_string(),
    });
    let client = client_with(&transport);
    let mut output = Vec::new();

    let err = execute_directions(&client, &directions_config(false, false), &mut output)
        .expect_err("transport failure should surface");

    match err {
        CliError::Provider(ProviderError::Transport(TransportError::Network { .. })) => {}
        other => panic!("expected a transport failure, found {other:?}"),
    }
    assert!(output.is_empty());
}

#[rstest]
fn merge_layers_honour_precedence() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({ "profile": "bike", "base_url": "http://from-file:8989" }),
        None,
    );
    composer.push_environment(json!({ "api_key": "env-key" }));
    composer.push_cli(json!({
        "points": ["49.415776,8.680916", "49.420577,8.688641"],
        "base_url": "http://from-cli:8989",
    }));

    let config =
        directions_config_from_layers(composer.layers()).expect("merged config should build");
    assert_eq!(config.provider.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.provider.base_url, "http://from-cli:8989");
    assert_eq!(config.profile, "bike");
}

#[rstest]
fn merge_layers_map_configuration_errors() {
    use ortho_config::MergeComposer;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "api_key": 42 }));

    let err = directions_config_from_layers(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

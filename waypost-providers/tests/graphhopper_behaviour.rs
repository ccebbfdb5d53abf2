//! Behavioural tests for the GraphHopper client.
//!
//! These tests drive [`GraphHopper`] through a [`RecordingTransport`] so
//! behaviour can be verified without a running deployment.

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::time::Duration;
use waypost_core::{IsochroneLimit, Isochrones, Matrix, Route, Routes, polyline};
use waypost_providers::ProviderError;
use waypost_providers::graphhopper::{
    DirectionsOptions, GraphHopper, GraphHopperConfig, IsochronesOptions, MatrixOptions, OutArray,
};
use waypost_providers::transport::TransportError;
use waypost_providers::transport::test_support::RecordingTransport;

type TransportCell = RefCell<Option<RecordingTransport>>;
type ClientCell = RefCell<Option<GraphHopper<RecordingTransport>>>;
type RouteResult = RefCell<Option<Result<Route, ProviderError>>>;
type RoutesResult = RefCell<Option<Result<Routes, ProviderError>>>;
type IsochronesResult = RefCell<Option<Result<Isochrones, ProviderError>>>;
type MatrixResult = RefCell<Option<Result<Matrix, ProviderError>>>;

#[fixture]
fn transport() -> TransportCell {
    RefCell::new(None)
}

#[fixture]
fn client() -> ClientCell {
    RefCell::new(None)
}

#[fixture]
fn route_result() -> RouteResult {
    RefCell::new(None)
}

#[fixture]
fn routes_result() -> RoutesResult {
    RefCell::new(None)
}

#[fixture]
fn isochrones_result() -> IsochronesResult {
    RefCell::new(None)
}

#[fixture]
fn matrix_result() -> MatrixResult {
    RefCell::new(None)
}

fn sample_points() -> Vec<Coord<f64>> {
    vec![
        Coord { x: 8.680916, y: 49.415776 },
        Coord { x: 8.688641, y: 49.420577 },
        Coord { x: 8.780916, y: 49.445776 },
    ]
}

fn directions_payload(paths: usize) -> Value {
    let geometry = polyline::encode(&sample_points()[..2], 5);
    let entries: Vec<Value> = (0..paths)
        .map(|_| json!({ "points": geometry, "time": 1_274_000, "distance": 23_455.5 }))
        .collect();
    json!({ "paths": entries })
}

fn isochrone_payload() -> Value {
    json!({
        "polygons": [
            { "geometry": { "type": "Polygon", "coordinates": [
                [[8.34, 48.23], [8.35, 48.23], [8.34, 48.24], [8.34, 48.23]],
            ] } },
            { "geometry": { "type": "Polygon", "coordinates": [
                [[8.33, 48.22], [8.36, 48.22], [8.33, 48.25], [8.33, 48.22]],
            ] } },
            { "geometry": { "type": "Polygon", "coordinates": [
                [[8.32, 48.21], [8.37, 48.21], [8.32, 48.26], [8.32, 48.21]],
            ] } },
        ],
    })
}

fn matrix_payload() -> Value {
    json!({
        "times": [[0, 956, null], [892, 0, 2_641], [null, 2_645, 0]],
        "distances": [[0, 11_562, null], [11_204, 0, 50_112], [null, 50_201, 0]],
    })
}

fn install(
    transport_cell: &TransportCell,
    client_cell: &ClientCell,
    recording: RecordingTransport,
) {
    *client_cell.borrow_mut() = Some(GraphHopper::with_transport(
        GraphHopperConfig::default().with_api_key("behaviour-key"),
        recording.clone(),
    ));
    *transport_cell.borrow_mut() = Some(recording);
}

// --- Given steps ---

#[given("a deployment answering with a single path")]
fn deployment_single_path(
    #[from(transport)] transport: &TransportCell,
    #[from(client)] client: &ClientCell,
) {
    install(
        transport,
        client,
        RecordingTransport::with_response(directions_payload(1)),
    );
}

#[given("a deployment answering with three alternative paths")]
fn deployment_three_paths(
    #[from(transport)] transport: &TransportCell,
    #[from(client)] client: &ClientCell,
) {
    install(
        transport,
        client,
        RecordingTransport::with_response(directions_payload(3)),
    );
}

#[given("a deployment answering with three reachability polygons")]
fn deployment_polygons(
    #[from(transport)] transport: &TransportCell,
    #[from(client)] client: &ClientCell,
) {
    install(
        transport,
        client,
        RecordingTransport::with_response(isochrone_payload()),
    );
}

#[given("a deployment answering with a travel time matrix")]
fn deployment_matrix(
    #[from(transport)] transport: &TransportCell,
    #[from(client)] client: &ClientCell,
) {
    install(
        transport,
        client,
        RecordingTransport::with_response(matrix_payload()),
    );
}

#[given("a deployment that refuses connections")]
fn deployment_refusing(
    #[from(transport)] transport: &TransportCell,
    #[from(client)] client: &ClientCell,
) {
    install(
        transport,
        client,
        RecordingTransport::with_error(TransportError::Network {
            url: "https://graphhopper.com/api/1/route?key=behaviour-key".to_string(),
            message: "connection refused".to_string(),
        }),
    );
}

// --- When steps ---

#[when("I request directions between two points")]
fn request_directions(
    #[from(client)] client: &ClientCell,
    #[from(route_result)] route_result: &RouteResult,
) {
    let guard = client.borrow();
    let graphhopper = guard.as_ref().expect("client must be initialised");
    *route_result.borrow_mut() = Some(graphhopper.directions(
        &sample_points()[..2],
        "car",
        &DirectionsOptions::default(),
    ));
}

#[when("I request alternative routes")]
fn request_alternatives(
    #[from(client)] client: &ClientCell,
    #[from(routes_result)] routes_result: &RoutesResult,
) {
    let guard = client.borrow();
    let graphhopper = guard.as_ref().expect("client must be initialised");
    *routes_result.borrow_mut() = Some(graphhopper.directions_alternatives(
        &sample_points()[..2],
        "car",
        &DirectionsOptions::default(),
    ));
}

#[when("I request isochrones sliced into three buckets")]
fn request_isochrones(
    #[from(client)] client: &ClientCell,
    #[from(isochrones_result)] isochrones_result: &IsochronesResult,
) {
    let guard = client.borrow();
    let graphhopper = guard.as_ref().expect("client must be initialised");
    let options = IsochronesOptions {
        buckets: Some(3),
        ..IsochronesOptions::default()
    };
    *isochrones_result.borrow_mut() = Some(graphhopper.isochrones(
        Coord { x: 8.34234, y: 48.23424 },
        "car",
        IsochroneLimit::Time(Duration::from_secs(1_000)),
        &options,
    ));
}

#[when("I request a matrix over three points")]
fn request_matrix(
    #[from(client)] client: &ClientCell,
    #[from(matrix_result)] matrix_result: &MatrixResult,
) {
    let guard = client.borrow();
    let graphhopper = guard.as_ref().expect("client must be initialised");
    let options = MatrixOptions {
        out_arrays: vec![OutArray::Times, OutArray::Distances],
        ..MatrixOptions::default()
    };
    *matrix_result.borrow_mut() = Some(graphhopper.matrix(&sample_points(), "car", &options));
}

#[when("I request a matrix with an out-of-range source")]
fn request_invalid_matrix(
    #[from(client)] client: &ClientCell,
    #[from(matrix_result)] matrix_result: &MatrixResult,
) {
    let guard = client.borrow();
    let graphhopper = guard.as_ref().expect("client must be initialised");
    let options = MatrixOptions {
        sources: Some(vec![100]),
        ..MatrixOptions::default()
    };
    *matrix_result.borrow_mut() = Some(graphhopper.matrix(&sample_points(), "car", &options));
}

// --- Then steps ---

#[then("the route is mapped with decoded geometry")]
fn then_route_mapped(#[from(route_result)] route_result: &RouteResult) {
    let borrowed = route_result.borrow();
    let result = borrowed.as_ref().expect("directions must have been requested");
    let route = result.as_ref().expect("expected Ok result");
    assert_eq!(route.geometry().len(), 2, "expected both points decoded");
    assert_eq!(route.duration(), Duration::from_secs(1_274));
    assert_eq!(route.distance(), 23_455);
}

#[then("three routes are returned")]
fn then_three_routes(#[from(routes_result)] routes_result: &RoutesResult) {
    let borrowed = routes_result.borrow();
    let result = borrowed.as_ref().expect("alternatives must have been requested");
    let routes = result.as_ref().expect("expected Ok result");
    assert_eq!(routes.len(), 3, "expected every path mapped");
}

#[then("the intervals slice the limit evenly")]
fn then_intervals(#[from(isochrones_result)] isochrones_result: &IsochronesResult) {
    let borrowed = isochrones_result.borrow();
    let result = borrowed.as_ref().expect("isochrones must have been requested");
    let isochrones = result.as_ref().expect("expected Ok result");
    let intervals: Vec<u64> = isochrones
        .isochrones()
        .iter()
        .map(|isochrone| isochrone.interval())
        .collect();
    assert_eq!(intervals, vec![333, 666, 1_000]);
}

#[then("every point appears in the query")]
fn then_points_in_query(#[from(transport)] transport: &TransportCell) {
    let guard = transport.borrow();
    let recording = guard.as_ref().expect("transport must be initialised");
    let request = recording.single_call();
    let query = request.url.query().unwrap_or_default();
    assert_eq!(
        query.matches("point=").count(),
        3,
        "expected one point parameter per input, got {query}"
    );
}

#[then("unroutable cells stay empty")]
fn then_null_cells(#[from(matrix_result)] matrix_result: &MatrixResult) {
    let borrowed = matrix_result.borrow();
    let result = borrowed.as_ref().expect("the matrix must have been requested");
    let matrix = result.as_ref().expect("expected Ok result");
    assert_eq!(matrix.durations()[0][2], None, "null should stay empty");
    assert_eq!(matrix.durations()[2][0], None, "null should stay empty");
    assert_eq!(
        matrix.durations()[0][1],
        Some(Duration::from_secs(956)),
        "routable cells should map"
    );
    assert_eq!(matrix.distances()[0][2], None, "null should stay empty");
}

#[then("a selection error is returned without any dispatch")]
fn then_selection_error(
    #[from(matrix_result)] matrix_result: &MatrixResult,
    #[from(transport)] transport: &TransportCell,
) {
    let borrowed = matrix_result.borrow();
    assert!(
        matches!(borrowed.as_ref(), Some(Err(ProviderError::Selection(_)))),
        "expected a selection error, got {borrowed:?}"
    );
    let guard = transport.borrow();
    let recording = guard.as_ref().expect("transport must be initialised");
    assert!(
        recording.calls().is_empty(),
        "no request should have been dispatched"
    );
}

#[then("a transport error is returned")]
fn then_transport_error(#[from(route_result)] route_result: &RouteResult) {
    let borrowed = route_result.borrow();
    assert!(
        matches!(borrowed.as_ref(), Some(Err(ProviderError::Transport(_)))),
        "expected a transport error, got {borrowed:?}"
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/graphhopper.feature", name = $title)]
        fn $fn_name(
            transport: TransportCell,
            client: ClientCell,
            route_result: RouteResult,
            routes_result: RoutesResult,
            isochrones_result: IsochronesResult,
            matrix_result: MatrixResult,
        ) {
            let _ = (
                transport,
                client,
                route_result,
                routes_result,
                isochrones_result,
                matrix_result,
            );
        }
    };
}

register_scenario!(routing_between_two_points, "routing between two points");
register_scenario!(
    requesting_alternative_routes,
    "requesting alternative routes"
);
register_scenario!(
    slicing_isochrones_into_buckets,
    "slicing isochrones into buckets"
);
register_scenario!(requesting_a_full_matrix, "requesting a full matrix");
register_scenario!(
    rejecting_an_out_of_range_selection,
    "rejecting an out-of-range matrix selection"
);
register_scenario!(surfacing_transport_failures, "surfacing transport failures");

use serde_json::json;

use fello_api::{Fellow, Finder, Interaction};
use table_engine::config::keys::{AGE, CHALLENGES, DURATION, GENDER, STATUS};
use table_engine::config::{FELLOWS, FINDERS, INTERACTIONS};
use table_engine::{
    Cell, EntityKind, FilterState, PageRequest, Row, Snapshot, SortSpec, TableQuery, apply_filters,
    compute_facets, normalize,
};

fn row(id: &str, status: Option<&str>, age: Option<f64>) -> Row {
    Row::new(id)
        .with(STATUS, Cell::Text(status.map(String::from)))
        .with(AGE, Cell::Number(age))
}

fn sample_fellows() -> Vec<Row> {
    [
        json!({"id": 1, "name": "Ana", "status": "active", "age": 25, "gender": "Female",
               "challenges": ["alcohol_use", "parenting"]}),
        json!({"id": 2, "name": "Ben", "status": "active", "age": "45", "gender": "Male",
               "challenges": ["drug_use"]}),
        json!({"id": 3, "name": "Cy", "status": "stale", "age": 65, "challenges": null}),
        json!({"id": 4, "name": "Dee", "status": "", "age": "unknown", "gender": "Female"}),
        json!({"id": 5, "name": "Eve", "status": null, "age": 31, "challenges": ["parenting"]}),
    ]
    .iter()
    .map(normalize::<Fellow>)
    .collect()
}

#[test]
fn empty_filter_state_is_identity() {
    let rows = sample_fellows();
    assert_eq!(apply_filters(&FELLOWS, &rows, &FilterState::new()), rows);
}

#[test]
fn filtering_yields_an_idempotent_subset() {
    let rows = sample_fellows();
    let mut state = FilterState::new();
    state.set(STATUS, ["active", "stale"]);
    state.set(AGE, ["41-50", "51plus"]);

    let once = apply_filters(&FELLOWS, &rows, &state);
    assert!(once.iter().all(|r| rows.contains(r)));
    assert_eq!(apply_filters(&FELLOWS, &once, &state), once);
    assert_eq!(once.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["2", "3"]);
}

#[test]
fn age_bucket_counts_sum_to_rows_with_age() {
    let rows = sample_fellows();
    let with_age = rows.iter().filter(|r| r.number(AGE).is_some()).count();
    let counts = compute_facets(&FELLOWS, &rows, AGE);
    assert_eq!(counts.total(), with_age);
    assert_eq!(with_age, 4);
}

#[test]
fn tag_fan_out_counts_each_element_once() {
    let rows = [Row::new("1").with(
        CHALLENGES,
        Cell::Tags(vec!["alcohol_use".into(), "parenting".into()]),
    )];
    let counts = compute_facets(&FINDERS, &rows, CHALLENGES);
    assert_eq!(counts.get("alcohol_use"), 1);
    assert_eq!(counts.get("parenting"), 1);
}

#[test]
fn status_then_age_scenario() {
    let rows = vec![
        row("1", Some("active"), Some(25.0)),
        row("2", Some("active"), Some(45.0)),
        row("3", Some("inactive"), Some(65.0)),
    ];
    let state = FilterState::from_pairs([(STATUS, "active")]);

    let visible = apply_filters(&FELLOWS, &rows, &state);
    assert_eq!(visible, rows[..2].to_vec());

    let counts = compute_facets(&FELLOWS, &visible, AGE);
    assert_eq!(counts.iter().collect::<Vec<_>>(), [("18-30", 1), ("41-50", 1)]);
    assert_eq!(counts.get("51plus"), 0);
}

#[test]
fn normalizer_defaults_missing_challenges() {
    let row = normalize::<Finder>(&json!({"id": 8, "name": "Fay"}));
    assert_eq!(row.cell(CHALLENGES), Some(&Cell::Tags(Vec::new())));
}

#[test]
fn falsy_status_contributes_nothing() {
    let rows = [row("1", Some(""), None), row("2", None, None)];
    assert!(compute_facets(&FELLOWS, &rows, STATUS).is_empty());
}

#[test]
fn single_select_filter_drives_view() {
    let snapshot = Snapshot::new(
        vec![
            Fellow {
                id: 1,
                name: "Ana".into(),
                gender: Some("Female".into()),
                ..Fellow::default()
            },
            Fellow {
                id: 2,
                name: "Ben".into(),
                gender: Some("Male".into()),
                ..Fellow::default()
            },
        ],
        Vec::new(),
        Vec::new(),
    );

    let mut query = TableQuery::default();
    query.filters.select_single(GENDER, Some("Male"));
    query.sort = Some(SortSpec::asc("name"));
    query.page = PageRequest::new(0, 25);
    assert!(query.validate(&FELLOWS).is_ok());

    let view = snapshot.view(EntityKind::Fellows, &query);
    assert_eq!(view.total, 2);
    assert_eq!(view.filtered, 1);
    assert_eq!(view.rows[0].id, "2");

    // Своя колонка не сужает свои же опции.
    let gender = view.facets.iter().find(|f| f.column == GENDER).unwrap();
    assert_eq!(gender.counts.get("Female"), 1);
    assert_eq!(gender.counts.get("Male"), 1);
}

#[test]
fn duration_filter_on_interactions() {
    let rows: Vec<Row> = [
        json!({"id": 1, "duration": 30, "interaction_status": "completed"}),
        json!({"id": 2, "duration": "45", "interaction_status": "upcoming"}),
        json!({"id": 3, "interaction_status": "upcoming"}),
    ]
    .iter()
    .map(normalize::<Interaction>)
    .collect();

    let state = FilterState::from_pairs([(DURATION, "45")]);
    let visible = apply_filters(&INTERACTIONS, &rows, &state);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, "2");

    let counts = compute_facets(&INTERACTIONS, &rows, DURATION);
    assert_eq!(counts.iter().collect::<Vec<_>>(), [("30", 1), ("45", 1)]);
}

#[test]
fn demo_snapshot_loads_all_three_lists() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/snapshot.json");
    let snapshot = Snapshot::load(&path).unwrap();
    assert_eq!(snapshot.len(EntityKind::Fellows), 3);
    assert_eq!(snapshot.len(EntityKind::Finders), 2);
    assert_eq!(snapshot.len(EntityKind::Interactions), 3);

    // Повторный тег в записи считается один раз.
    let challenges = compute_facets(&FELLOWS, snapshot.rows(EntityKind::Fellows), CHALLENGES);
    assert_eq!(challenges.get("parenting"), 1);

    match snapshot.stats(EntityKind::Interactions) {
        table_engine::EntityStats::Interactions(stats) => {
            assert_eq!(stats.total, 3);
            assert_eq!(stats.completed, 1);
        }
        other => panic!("unexpected stats: {other:?}"),
    }
}

//! Export table layout and cell flattening.
//!
//! Run with: `cargo test --test export_test`
use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use formfolio_backend::export::{
    Cell, ExportError, MAX_COLUMN_WIDTH, Sheet, build_sheet, default_conventions,
    download_filename, flatten_answer, xlsx,
};
use formfolio_backend::models::questions::{Model as Question, QuestionType};
use formfolio_backend::models::submissions::Model as Submission;

fn question(title: &str, step: i32, order: i32, question_type: QuestionType) -> Question {
    Question {
        id: Uuid::new_v4(),
        portfolio_id: Uuid::nil(),
        step,
        sort_order: order,
        title: title.to_string(),
        description: String::new(),
        thumbnail: None,
        question_type,
        options: None,
        min_length: 0,
        max_length: 500,
        require_min_length: false,
        is_required: true,
        created_at: Utc::now(),
    }
}

fn submission(company: &str, responses: Value) -> Submission {
    let now = Utc::now();
    Submission {
        id: Uuid::new_v4(),
        portfolio_id: Uuid::nil(),
        company_name: company.to_string(),
        pin_hash: String::new(),
        responses,
        is_draft: false,
        ip_address: None,
        completed_at: Some(now),
        created_at: now,
        updated_at: now,
    }
}

fn text(cell: &Cell) -> &str {
    match cell {
        Cell::Text(s) => s,
        Cell::Number(_) => panic!("expected a text cell"),
    }
}

#[test]
fn test_no_submissions_is_no_data() {
    let questions = vec![question("Name", 1, 0, QuestionType::Text)];
    let result = build_sheet(&questions, &[], &default_conventions());
    assert!(matches!(result, Err(ExportError::NoData)));
}

#[test]
fn test_column_count_and_room_blocks() {
    let questions = vec![
        question("Address", 1, 0, QuestionType::Text),
        question("Brochure", 1, 1, QuestionType::File),
        question("Amenities", 2, 0, QuestionType::Checkbox),
    ];
    let submissions = vec![
        submission(
            "ACME",
            json!({
                "rooms": [
                    { "name": "Deluxe", "desc": "Sea view", "type": "Double", "price": 120 },
                    { "name": "Suite", "desc": "Top floor", "type": "King", "price": 300 },
                ],
                "specials": [{ "name": "Early bird", "desc": "10% off" }],
            }),
        ),
        submission(
            "Globex",
            json!({ "rooms": [{ "name": "Standard", "desc": "", "type": "Twin", "price": "80" }] }),
        ),
    ];

    let sheet = build_sheet(&questions, &submissions, &default_conventions()).unwrap();

    // 2 fixed + 2 non-file questions + 4 per room + 2 per special
    assert_eq!(sheet.headers.len(), 2 + 2 + 4 * 2 + 2);
    assert!(!sheet.headers.contains(&"Brochure".to_string()));
    assert_eq!(
        &sheet.headers[..8],
        &[
            "No.",
            "Company Name",
            "Address",
            "Amenities",
            "Room1 Name",
            "Room1 Description",
            "Room1 Type",
            "Room1 Rate",
        ]
    );
    assert_eq!(sheet.headers[8], "Room2 Name");
    assert_eq!(sheet.headers[12], "Special1 Name");
    assert_eq!(sheet.headers[13], "Special1 Description");

    let acme = &sheet.rows[0];
    assert_eq!(acme[0], Cell::Number(1));
    assert_eq!(text(&acme[1]), "ACME");
    assert_eq!(text(&acme[8]), "Suite");
    assert_eq!(text(&acme[11]), "300");
    assert_eq!(text(&acme[12]), "Early bird");

    // Records beyond a submission's own list stay blank.
    let globex = &sheet.rows[1];
    assert_eq!(globex[0], Cell::Number(2));
    assert_eq!(text(&globex[4]), "Standard");
    assert_eq!(text(&globex[7]), "80");
    assert_eq!(text(&globex[8]), "");
    assert_eq!(text(&globex[12]), "");
    assert!(sheet.rows.iter().all(|row| row.len() == sheet.headers.len()));
}

#[test]
fn test_room_block_follows_matching_question_header() {
    let questions = vec![
        question("Address", 1, 0, QuestionType::Text),
        question("Room info", 1, 1, QuestionType::Parlor),
        question("Check-in time", 2, 0, QuestionType::Text),
    ];
    let submissions = vec![submission(
        "ACME",
        json!({ "rooms": [{ "name": "Deluxe", "desc": "Sea view", "type": "Double", "price": 120 }] }),
    )];

    let sheet = build_sheet(&questions, &submissions, &default_conventions()).unwrap();

    assert_eq!(
        sheet.headers,
        vec![
            "No.",
            "Company Name",
            "Address",
            "Room info",
            "Room1 Name",
            "Room1 Description",
            "Room1 Type",
            "Room1 Rate",
            "Check-in time",
        ]
    );
    assert_eq!(text(&sheet.rows[0][4]), "Deluxe");
    assert_eq!(text(&sheet.rows[0][8]), "");
}

#[test]
fn test_refund_schedule_renders_in_its_question_column() {
    let refund = question("Refund policy", 1, 0, QuestionType::Refund);
    let submissions = vec![submission(
        "ACME",
        json!({ "refunds": [
            { "id": "refund-1", "percent": 100 },
            { "id": "refund-2", "day": 3, "percent": "50" },
        ] }),
    )];

    let sheet = build_sheet(&[refund], &submissions, &default_conventions()).unwrap();

    assert_eq!(sheet.headers, vec!["No.", "Company Name", "Refund policy"]);
    assert_eq!(
        text(&sheet.rows[0][2]),
        "Visit day: 100% refund, 3 days before: 50% refund"
    );
}

#[test]
fn test_conventions_without_records_add_no_columns() {
    let questions = vec![question("Name", 1, 0, QuestionType::Text)];
    let submissions = vec![submission("ACME", json!({ "rooms": [] }))];

    let sheet = build_sheet(&questions, &submissions, &default_conventions()).unwrap();
    assert_eq!(sheet.headers, vec!["No.", "Company Name", "Name"]);
}

#[test]
fn test_questions_follow_step_then_order() {
    let questions = vec![
        question("C", 2, 0, QuestionType::Text),
        question("B", 1, 5, QuestionType::Textarea),
        question("A", 1, 1, QuestionType::Text),
    ];
    let submissions = vec![submission("ACME", json!({}))];

    let sheet = build_sheet(&questions, &submissions, &[]).unwrap();
    assert_eq!(sheet.headers[2..], ["A", "B", "C"]);
}

#[test]
fn test_answers_are_read_by_question_id() {
    let name = question("Name", 1, 0, QuestionType::Text);
    let amenities = question("Amenities", 1, 1, QuestionType::Checkbox);
    let responses = json!({
        name.id.to_string(): "Seaside Inn",
        amenities.id.to_string(): ["Wifi", "Pool"],
    });

    let sheet = build_sheet(
        &[name, amenities],
        &[submission("ACME", responses)],
        &default_conventions(),
    )
    .unwrap();
    assert_eq!(text(&sheet.rows[0][2]), "Seaside Inn");
    assert_eq!(text(&sheet.rows[0][3]), "Wifi, Pool");
}

#[test]
fn test_flatten_checkbox_with_inputs() {
    let answer = json!({
        "checked": ["Parking", "Pool"],
        "inputs": { "Parking": "20 spaces" },
    });
    assert_eq!(
        flatten_answer(QuestionType::Checkbox, &answer),
        "Parking, Pool / Parking: 20 spaces"
    );

    let single = json!({ "selected": "Pool", "inputs": {} });
    assert_eq!(flatten_answer(QuestionType::Checkbox, &single), "Pool");
}

#[test]
fn test_flatten_other_shapes() {
    assert_eq!(flatten_answer(QuestionType::Text, &Value::Null), "");
    assert_eq!(flatten_answer(QuestionType::Text, &json!(12)), "12");
    assert_eq!(
        flatten_answer(QuestionType::Agreement, &json!({ "agreed": true })),
        r#"{"agreed":true}"#
    );
    assert_eq!(
        flatten_answer(
            QuestionType::Repeatable,
            &json!([{ "Name": "Deluxe", "Rate": 100 }, { "Name": "Suite", "Rate": 200 }])
        ),
        "Deluxe 100, Suite 200"
    );
}

#[test]
fn test_column_widths_are_capped() {
    let sheet = Sheet {
        headers: vec!["No.".to_string(), "Notes".to_string()],
        rows: vec![vec![Cell::Number(1), Cell::Text("x".repeat(120))]],
    };
    assert_eq!(sheet.column_widths(), vec![5, MAX_COLUMN_WIDTH]);
}

#[test]
fn test_download_filename_is_encoded() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(
        download_filename("Seaside Inn", date),
        "Seaside%20Inn_submissions_2025-03-07.xlsx"
    );
}

#[test]
fn test_render_produces_a_zip_workbook() {
    let sheet = build_sheet(
        &[question("Name", 1, 0, QuestionType::Text)],
        &[submission("ACME", json!({}))],
        &[],
    )
    .unwrap();

    let bytes = xlsx::render(&sheet).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

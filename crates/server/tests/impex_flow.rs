mod support;

use reqwest::StatusCode;
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use support::{admin, editor, start_server, user};

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS: &str = "application/vnd.ms-excel";

fn workbook(sheet: &str, rows: &[&[&str]]) -> anyhow::Result<Vec<u8>> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name(sheet)?;
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                ws.write_string(r as u32, c as u16, *cell)?;
            }
        }
    }
    Ok(wb.save_to_buffer()?)
}

#[tokio::test]
async fn tags_export_as_xlsx() -> anyhow::Result<()> {
    let app = start_server().await?;
    for name in ["Kör", "Orkester"] {
        let res = app.post("/api/v1/tags", &editor()).json(&json!({ "name": name })).send().await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app.get("/api/v1/tags", &user()).header("Accept", XLSX).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], XLSX);
    assert_eq!(res.headers()["content-disposition"], "attachment; filename=\"tags.xlsx\"");
    let bytes = res.bytes().await?;
    assert!(bytes.starts_with(b"PK"));

    let res = app.get("/api/v1/tags", &user()).header("Accept", XLS).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_ACCEPTABLE);

    let res = app.get("/api/v1/tags?ids=1,x", &user()).header("Accept", XLSX).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn task_categories_import_from_xlsx() -> anyhow::Result<()> {
    let app = start_server().await?;
    let body = workbook("Task categories", &[&["Id", "Name", "Has actor"], &["", "Scen", "true"], &["", "Ljud", "false"]])?;
    let res = app.post("/api/v1/task-categories", &admin()).header("Content-Type", XLSX).body(body).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let result: Value = res.json().await?;
    assert_eq!(result["success"], true);

    let res = app.get("/api/v1/task-categories?sort=name", &user()).send().await?;
    let page: Value = res.json().await?;
    assert_eq!(page["page"]["totalElements"], 2);
    assert_eq!(page["_embedded"]["task-categories"][0]["name"], "Ljud");
    assert_eq!(page["_embedded"]["task-categories"][1]["hasActor"], true);
    Ok(())
}

#[tokio::test]
async fn invalid_import_writes_nothing() -> anyhow::Result<()> {
    let app = start_server().await?;
    let body = workbook("Tags", &[&["Id", "Name"], &["", "Bra"], &["4711", "Finns inte"]])?;
    let res = app.post("/api/v1/tags", &admin()).header("Content-Type", XLSX).body(body).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let result: Value = res.json().await?;
    assert_eq!(result["success"], false);
    assert!(!result["messages"].as_array().cloned().unwrap_or_default().is_empty());

    let res = app.get("/api/v1/tags", &user()).send().await?;
    assert_eq!(res.json::<Value>().await?["page"]["totalElements"], 0);

    let body = workbook("Tags", &[&["Id", "Name"], &["", "Bra"]])?;
    let res = app.post("/api/v1/tags", &user()).header("Content-Type", XLSX).body(body).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

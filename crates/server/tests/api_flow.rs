mod support;

use reqwest::StatusCode;
use serde_json::{json, Value};
use support::{admin, editor, start_server, user, TestApp};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

async fn create_spexare(app: &TestApp, first: &str, last: &str) -> anyhow::Result<i64> {
    let res = app.post("/api/v1/spexare", &user()).json(&json!({"firstName": first, "lastName": last})).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    Ok(body["id"].as_i64().unwrap_or_default())
}

#[tokio::test]
async fn spexare_crud_with_hal_links() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = app
        .post("/api/v1/spexare", &user())
        .header("X-Forwarded-Proto", "https")
        .json(&json!({"firstName": "Kalle", "lastName": "Anka", "nickName": "KA"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers().get("location").and_then(|v| v.to_str().ok()).map(str::to_string);
    let created: Value = res.json().await?;
    let id = created["id"].as_i64().unwrap_or_default();
    let expected = format!("{}/api/v1/spexare/{id}", app.base_url.replacen("http://", "https://", 1));
    assert_eq!(location.as_deref(), Some(expected.as_str()));
    assert_eq!(created["_links"]["self"]["href"], expected);
    assert_eq!(created["createdBy"], "user");

    let res = app.get(&format!("/api/v1/spexare/{id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/hal+json");

    let res = app
        .put(&format!("/api/v1/spexare/{id}"), &user())
        .json(&json!({"id": id + 1, "firstName": "Kalle", "lastName": "Anka"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.patch(&format!("/api/v1/spexare/{id}"), &user()).json(&json!({"id": id, "nickName": null})).send().await?;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let patched: Value = res.json().await?;
    assert_eq!(patched["nickName"], Value::Null);
    assert_eq!(patched["firstName"], "Kalle");

    let res = app.delete(&format!("/api/v1/spexare/{id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = app.delete(&format!("/api/v1/spexare/{id}"), &editor()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.get(&format!("/api/v1/spexare/{id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn spexare_paging_and_filter() -> anyhow::Result<()> {
    let app = start_server().await?;
    for (first, last) in [("Anna", "Ek"), ("Bertil", "Ek"), ("Cecilia", "Gran")] {
        create_spexare(&app, first, last).await?;
    }
    let res = app.get("/api/v1/spexare?filter=lastName:Ek&size=1&sort=firstName,desc", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["page"]["totalElements"], 2);
    assert_eq!(body["page"]["totalPages"], 2);
    assert_eq!(body["_embedded"]["spexare"][0]["firstName"], "Bertil");
    let next = body["_links"]["next"]["href"].as_str().unwrap_or_default();
    assert!(next.contains("page=1") && next.contains("filter=lastName%3AEk"));
    assert!(body["_links"].get("prev").is_none());

    let res = app.get("/api/v1/spexare?filter=shoeSize:42", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = app.get("/api/v1/spexare?sort=shoeSize", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = app.get("/api/v1/spexare?page=18446744073709551615", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = app.get("/api/v1/tags?page=18446744073709551615&size=100", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn partner_is_mutual() -> anyhow::Result<()> {
    let app = start_server().await?;
    let a = create_spexare(&app, "Adam", "Ek").await?;
    let b = create_spexare(&app, "Bea", "Ek").await?;

    let res = app.put(&format!("/api/v1/spexare/{a}/partner/{a}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = app.put(&format!("/api/v1/spexare/{a}/partner/{b}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let res = app.get(&format!("/api/v1/spexare/{b}/partner"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["id"], a);

    let res = app.delete(&format!("/api/v1/spexare/{b}/partner"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.get(&format!("/api/v1/spexare/{a}/partner"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn image_upload_detects_type() -> anyhow::Result<()> {
    let app = start_server().await?;
    let id = create_spexare(&app, "Bild", "Sson").await?;
    let path = format!("/api/v1/spexare/{id}/image");

    let res = app.get(&path, &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.put(&path, &user()).body(PNG.to_vec()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.get(&path, &user()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await?.as_ref(), PNG);

    let res = app.post(&path, &user()).header("Content-Type", "text/plain").body("hello").send().await?;
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let res = app.delete(&path, &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn tagging_lifecycle() -> anyhow::Result<()> {
    let app = start_server().await?;
    let sid = create_spexare(&app, "Tagg", "Ad").await?;
    let res = app.post("/api/v1/tags", &editor()).json(&json!({"name": "Orkester"})).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let tag_id = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();

    let path = format!("/api/v1/spexare/{sid}/tags/{tag_id}");
    let res = app.put(&path, &user()).send().await?;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let res = app.post(&path, &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.get(&format!("/api/v1/spexare/{sid}/tags"), &user()).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["_embedded"]["tags"][0]["name"], "Orkester");

    let res = app.delete(&path, &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.delete(&path, &user()).send().await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = app.put(&format!("/api/v1/spexare/{sid}/tags/99999"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn activity_tree_and_search_facets() -> anyhow::Result<()> {
    let app = start_server().await?;
    let sid = create_spexare(&app, "Sökbar", "Person").await?;
    create_spexare(&app, "Annan", "Person").await?;

    let res = app.post("/api/v1/spex", &admin()).json(&json!({"year": "1999", "title": "Fritiof"})).send().await?;
    let spex_id = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();
    let res = app.post("/api/v1/tasks", &admin()).json(&json!({"name": "Sångare"})).send().await?;
    let task_id = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();

    let res = app.post(&format!("/api/v1/spexare/{sid}/activities"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let aid = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();
    let base = format!("/api/v1/spexare/{sid}/activities/{aid}");

    let res = app.post(&format!("{base}/spex-activities/{spex_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let said = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();
    let res = app.post(&format!("{base}/spex-activities/{spex_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = app.get(&format!("{base}/spex-activities/{said}/spex"), &user()).send().await?;
    assert_eq!(res.json::<Value>().await?["title"], "Fritiof");

    let res = app.post(&format!("{base}/task-activities/{task_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let taid = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();
    let res = app
        .post(&format!("{base}/task-activities/{taid}/actors/B1"), &user())
        .json(&json!({"role": "Kungen"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app
        .post(&format!("{base}/task-activities/{taid}/actors/NOPE"), &user())
        .json(&json!({"role": "Drottningen"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.get(&format!("/api/v1/spexare/{}/activities/{aid}", sid + 1), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.get("/api/v1/spexare?q=kungen", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["page"]["totalElements"], 1);
    assert_eq!(body["_embedded"]["spexare"][0]["id"], sid);
    let facets = body["_facets"].as_array().cloned().unwrap_or_default();
    let year = facets.iter().find(|f| f["name"] == "activities.spexActivity.spex.year").cloned().unwrap_or_default();
    assert_eq!(year["values"]["1999"], 1);
    let vocal = facets.iter().find(|f| f["name"] == "activities.taskActivities.actors.vocal.id").cloned().unwrap_or_default();
    assert_eq!(vocal["values"]["B1"], 1);
    Ok(())
}

#[tokio::test]
async fn spex_revivals_and_category() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = app.post("/api/v1/spex", &admin()).json(&json!({"year": "1990", "title": "Napoleon"})).send().await?;
    let id = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();

    let res = app.post(&format!("/api/v1/spex/{id}/revivals/2005"), &editor()).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let revival = res.json::<Value>().await?;
    assert_eq!(revival["revival"], true);
    assert_eq!(revival["title"], "Napoleon");
    let res = app.post(&format!("/api/v1/spex/{id}/revivals/2005"), &editor()).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.get("/api/v1/spex", &user()).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["page"]["totalElements"], 1);
    let res = app.get("/api/v1/spex/revivals", &user()).send().await?;
    assert_eq!(res.json::<Value>().await?["page"]["totalElements"], 1);
    let rid = revival["id"].as_i64().unwrap_or_default();
    let res = app.get(&format!("/api/v1/spex/{rid}/parent"), &user()).send().await?;
    assert_eq!(res.json::<Value>().await?["id"], id);
    let res = app.get(&format!("/api/v1/spex/{id}/parent"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.post("/api/v1/spex/categories", &admin()).json(&json!({"name": "Chalmersspexet", "firstYear": "1948"})).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let cid = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();
    let res = app.put(&format!("/api/v1/spex/{id}/category/{cid}"), &editor()).send().await?;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let res = app.get(&format!("/api/v1/spex/{id}/category"), &user()).send().await?;
    assert_eq!(res.json::<Value>().await?["name"], "Chalmersspexet");

    let res = app.delete(&format!("/api/v1/spex/{id}/revivals/2005"), &editor()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn settings_types_follow_accept_language() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = app.get("/api/v1/settings/types/VOCAL", &user()).header("Accept-Language", "en-GB,en;q=0.8").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let types = body["_embedded"]["types"].as_array().cloned().unwrap_or_default();
    assert_eq!(types.len(), 8);
    assert!(types.iter().all(|t| t["type"] == "VOCAL"));

    let res = app.get("/api/v1/settings/types/VOCAL/B1", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = app.get("/api/v1/settings/types/UNKNOWN", &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn spexare_contact_details_are_typed() -> anyhow::Result<()> {
    let app = start_server().await?;
    let kalle = create_spexare(&app, "Kalle", "Anka").await?;
    let rut = create_spexare(&app, "Rut", "Ek").await?;
    let base = format!("/api/v1/spexare/{kalle}");

    let res = app.get(&base, &user()).send().await?;
    let body: Value = res.json().await?;
    assert!(body["_links"]["addresses"]["href"].as_str().unwrap_or_default().ends_with("/addresses"));

    let res = app.post(&format!("{base}/addresses/HOME"), &user()).json(&json!({"city": "Göteborg"})).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let home: Value = res.json().await?;
    let home_id = home["id"].as_i64().unwrap_or_default();
    assert_eq!(home["type"], "HOME");
    assert!(home["_links"]["type"]["href"].as_str().unwrap_or_default().ends_with("/settings/types/ADDRESS/HOME"));

    let res = app.post(&format!("{base}/addresses/HOME"), &user()).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = app.post(&format!("{base}/addresses/B1"), &user()).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = app.post(&format!("{base}/addresses/WORK"), &user()).json(&json!({"emailAddress": "nope"})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .patch(&format!("{base}/addresses/HOME/{home_id}"), &user())
        .json(&json!({"id": home_id, "streetAddress": "Kungsgatan 1"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let patched: Value = res.json().await?;
    assert_eq!(patched["city"], "Göteborg");
    let res = app
        .patch(&format!("/api/v1/spexare/{rut}/addresses/HOME/{home_id}"), &user())
        .json(&json!({"id": home_id, "city": "Lund"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let res = app.get(&format!("/api/v1/spexare/{rut}/addresses/{home_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.post(&format!("{base}/memberships/FGV/1999"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let membership_id = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();
    let res = app.post(&format!("{base}/memberships/FGV/1999"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = app.get(&format!("{base}/memberships?filter=year:1999"), &user()).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["page"]["totalElements"], 1);
    let res = app.delete(&format!("{base}/memberships/CING/{membership_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let res = app.delete(&format!("{base}/memberships/FGV/{membership_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.post(&format!("{base}/toggles/DECEASED/false"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let toggle_id = res.json::<Value>().await?["id"].as_i64().unwrap_or_default();
    let res = app.put(&format!("{base}/toggles/DECEASED/{toggle_id}/maybe"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = app.put(&format!("{base}/toggles/DECEASED/{toggle_id}/true"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(res.json::<Value>().await?["value"], true);

    let res = app.post(&format!("{base}/consents/PUBLISH/true"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app.get(&format!("{base}/consents"), &user()).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["_embedded"]["consents"][0]["type"], "PUBLISH");

    let res = app.delete(&format!("{base}/addresses/HOME/{home_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = app.delete(&format!("{base}/addresses/HOME/{home_id}"), &user()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

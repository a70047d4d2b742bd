//! End-to-end tests against a real server and a throwaway database.

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use diesel::RunQueryDsl;
use futures::Future;
use orgdesk_api::{config::Config, Server};
use orgdesk_db::{
    object_id::{OrganizationId, SessionId, SystemGroupId, TemplateGroupId, UserId},
    sessions::Session,
    test::{create_database, DatabaseInfo, TestDatabase},
    users::NewUser,
    PoolExt,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub struct TestClient {
    base: String,
    token: String,
    client: reqwest::Client,
}

impl TestClient {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::finish(res).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::finish(res).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::finish(res).await
    }

    async fn finish(res: reqwest::Response) -> Result<(StatusCode, Value)> {
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }
}

pub struct TestApp {
    pub database: TestDatabase,
    pub info: DatabaseInfo,
    pub base_url: String,
    /// Signed in as the seeded superadmin.
    pub admin: TestClient,
}

impl TestApp {
    /// A client for a new active user with no group memberships.
    pub async fn add_user(&self, name: &str) -> Result<(UserId, TestClient)> {
        let user_id = UserId::new();
        let session_id = SessionId::new();
        let user = NewUser {
            user_id,
            email: format!("{}@example.com", user_id),
            name: name.to_string(),
            active: true,
        };

        self.database
            .pool
            .interact(move |conn| {
                diesel::insert_into(orgdesk_db::users::table)
                    .values(&user)
                    .execute(conn)?;
                diesel::insert_into(orgdesk_db::sessions::table)
                    .values(Session {
                        session_id,
                        user_id,
                        expires: Utc::now() + Duration::hours(1),
                    })
                    .execute(conn)?;
                Ok::<_, orgdesk_api::Error>(())
            })
            .await?;

        Ok((user_id, self.client(session_id)))
    }

    fn client(&self, session: SessionId) -> TestClient {
        TestClient {
            base: self.base_url.clone(),
            token: session.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

async fn start_app(database: TestDatabase, info: DatabaseInfo) -> Result<TestApp> {
    orgdesk_test::init_tracing();

    let config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        env: "test".to_string(),
        database_url: database.url.clone(),
        database_pool_size: 4,
        honeycomb_team: None,
        honeycomb_dataset: String::new(),
    };

    let server = orgdesk_api::create_server(config).await?;
    let Server { host, port, .. } = &server;
    let base_url = format!("http://{}:{}/api", host, port);
    tokio::task::spawn(server.run());

    let app = TestApp {
        admin: TestClient {
            base: base_url.clone(),
            token: info.admin_session.to_string(),
            client: reqwest::Client::new(),
        },
        database,
        info,
        base_url,
    };

    let admin = &app.admin;
    let healthy = orgdesk_test::wait_for(50, || async move {
        match admin.get("health").await {
            Ok((StatusCode::OK, _)) => Some(()),
            _ => None,
        }
    })
    .await;
    healthy.ok_or_else(|| anyhow!("server never became healthy"))?;

    Ok(app)
}

pub async fn run_app_test<F, R>(f: F)
where
    F: FnOnce(TestApp) -> R,
    R: Future<Output = Result<()>>,
{
    let (database, info) = create_database().await.expect("Creating database");
    let cleanup = database.clone();
    let app = start_app(database, info).await.expect("Starting app");
    let result = f(app).await;
    cleanup.drop_db().expect("Cleaning up");
    result.unwrap();
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn group_delete_blocked_while_it_has_members() {
    run_app_test(|app| async move {
        let (user_id, _) = app.add_user("Member").await?;

        let (status, group) = app
            .admin
            .post(
                "system_groups",
                json!({ "name": "Viewers", "permissions": ["system.users.view"] }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{group}");
        assert_eq!(group["permissions"], json!(["system.users.view"]));
        let group_id = id_of(&group);

        let (status, _) = app
            .admin
            .post(
                &format!("system_groups/{group_id}/members"),
                json!({ "user_id": user_id }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.admin.delete(&format!("system_groups/{group_id}")).await?;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["kind"], json!("invariant_violation"));

        let (status, _) = app
            .admin
            .delete(&format!("system_groups/{group_id}/members/{user_id}"))
            .await?;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.admin.delete(&format!("system_groups/{group_id}")).await?;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.admin.get(&format!("system_groups/{group_id}")).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn group_rejects_codes_from_the_other_scope() {
    run_app_test(|app| async move {
        let (status, body) = app
            .admin
            .post(
                "template_groups",
                json!({ "name": "Mixed", "permissions": ["org.news.view", "system.users.view"] }),
            )
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.to_string().contains("system.users.view"), "{body}");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn template_membership_grants_org_access() {
    run_app_test(|app| async move {
        let org = app.info.organization_id;
        let (user_id, editor) = app.add_user("Editor").await?;

        let (status, _) = editor.get(&format!("orgs/{org}/news")).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, group) = app
            .admin
            .post(
                "template_groups",
                json!({ "name": "Editors", "permissions": ["org.news.view", "org.news.edit"] }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{group}");
        let group_id = id_of(&group);

        let (status, _) = app
            .admin
            .post(
                &format!("template_groups/{group_id}/members"),
                json!({ "user_id": user_id, "organization_id": org }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK);

        let (status, item) = editor
            .post(
                &format!("orgs/{org}/news"),
                json!({ "title": "Hello", "body": "First post" }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{item}");

        let (status, _) = editor
            .delete(&format!("orgs/{org}/news/{}", id_of(&item)))
            .await?;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = editor.get("organizations").await?;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // The membership does not reach another organization.
        let other = OrganizationId::new();
        let (status, _) = editor.get(&format!("orgs/{other}/news")).await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn department_reorder_swaps_neighbours() {
    run_app_test(|app| async move {
        let org = app.info.organization_id;
        let path = format!("orgs/{org}/departments");

        let mut ids = Vec::new();
        for name in ["Sales", "Support", "Engineering"] {
            let (status, dept) = app.admin.post(&path, json!({ "name": name })).await?;
            assert_eq!(status, StatusCode::CREATED, "{dept}");
            ids.push(id_of(&dept));
        }

        let (status, list) = app
            .admin
            .post(
                &format!("{path}/{}/move", ids[2]),
                json!({ "direction": "up" }),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "{list}");
        let names = list
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|d| d["name"].as_str().unwrap_or_default().to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        assert_eq!(names, vec!["Sales", "Engineering", "Support"]);

        let (status, body) = app
            .admin
            .post(
                &format!("{path}/{}/move", ids[0]),
                json!({ "direction": "up" }),
            )
            .await?;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");

        let (status, _) = app
            .admin
            .post(
                &format!("{path}/{}/move", ids[1]),
                json!({ "direction": "down" }),
            )
            .await?;
        assert_eq!(status, StatusCode::CONFLICT);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn builtin_permissions_cannot_be_deleted() {
    run_app_test(|app| async move {
        let (status, body) = app.admin.delete("org_permissions/org.news.edit").await?;
        assert_eq!(status, StatusCode::CONFLICT, "{body}");

        let (status, _) = app
            .admin
            .post(
                "org_permissions",
                json!({ "code": "org.reports.view", "description": "View reports" }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app.admin.delete("org_permissions/org.reports.view").await?;
        assert_eq!(status, StatusCode::OK);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn membership_targets_must_exist() {
    run_app_test(|app| async move {
        let (user_id, _) = app.add_user("Member").await?;
        let org = app.info.organization_id;

        let (status, group) = app
            .admin
            .post(
                "system_groups",
                json!({ "name": "Viewers", "permissions": ["system.users.view"] }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{group}");
        let group_id = id_of(&group);

        let (status, body) = app
            .admin
            .post(
                &format!("system_groups/{group_id}/members"),
                json!({ "user_id": UserId::new() }),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
        assert_eq!(body["error"]["kind"], json!("not_found"));

        let (status, body) = app
            .admin
            .post(
                &format!("system_groups/{}/members", SystemGroupId::new()),
                json!({ "user_id": user_id }),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        let (status, template) = app
            .admin
            .post(
                "template_groups",
                json!({ "name": "Readers", "permissions": ["org.news.view"] }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{template}");
        let template_id = id_of(&template);

        let (status, body) = app
            .admin
            .post(
                &format!("template_groups/{template_id}/members"),
                json!({ "user_id": UserId::new(), "organization_id": org }),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        let (status, body) = app
            .admin
            .post(
                &format!("template_groups/{template_id}/members"),
                json!({ "user_id": user_id, "organization_id": OrganizationId::new() }),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        let (status, body) = app
            .admin
            .post(
                &format!("template_groups/{}/members", TemplateGroupId::new()),
                json!({ "user_id": user_id, "organization_id": org }),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

        // Nothing was added along the way.
        let (status, group) = app.admin.get(&format!("system_groups/{group_id}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(group["members"], json!([]));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn content_for_unknown_organization_is_not_found() {
    run_app_test(|app| async move {
        let missing = OrganizationId::new();

        let (status, body) = app
            .admin
            .post(
                &format!("orgs/{missing}/departments"),
                json!({ "name": "Sales" }),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
        assert_eq!(body["error"]["kind"], json!("not_found"));

        let (status, body) = app
            .admin
            .post(
                &format!("orgs/{missing}/news"),
                json!({ "title": "Hello", "body": "Nobody reads this" }),
            )
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn concurrent_department_creation_keeps_order_unique() {
    run_app_test(|app| async move {
        let org = app.info.organization_id;
        let path = format!("orgs/{org}/departments");

        let requests = (0..8).map(|i| {
            let path = path.as_str();
            let admin = &app.admin;
            async move { admin.post(path, json!({ "name": format!("Dept {i}") })).await }
        });
        for result in futures::future::join_all(requests).await {
            let (status, body) = result?;
            assert_eq!(status, StatusCode::CREATED, "{body}");
        }

        let (status, list) = app.admin.get(&path).await?;
        assert_eq!(status, StatusCode::OK);
        let mut orders = list
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|d| d["sort_order"].as_i64())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        orders.sort_unstable();
        assert_eq!(orders, (0..8).collect::<Vec<i64>>());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn seeded_codes_match_the_builtin_registry() {
    run_app_test(|app| async move {
        fn codes(list: &Value) -> Vec<String> {
            let mut codes = list
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|p| p["code"].as_str().map(String::from))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            codes.sort();
            codes
        }

        fn builtin(list: Vec<orgdesk_auth::PermissionInfo>) -> Vec<String> {
            let mut codes = list.into_iter().map(|p| p.code).collect::<Vec<_>>();
            codes.sort();
            codes
        }

        let (status, system) = app.admin.get("system_permissions").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            codes(&system),
            builtin(orgdesk_auth::PermissionRegistry::builtin_system_permissions())
        );

        let (status, org) = app.admin.get("org_permissions").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            codes(&org),
            builtin(orgdesk_auth::PermissionRegistry::builtin_org_permissions())
        );
        Ok(())
    })
    .await
}

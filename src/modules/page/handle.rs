use actix_web::{get, web, HttpRequest};

use crate::{
    api::{error, success},
    constants::REFRESH_COOKIE,
    middlewares::get_viewer,
    modules::{
        page::model::HomePage,
        upload::{
            model::{ListingPage, SortQuery},
            service::UploadService,
        },
        user::{handle::expired_refresh_cookie, service::UserService},
    },
};

/// Staff who are not superusers land on the staff page, other signed-in
/// users on their own page, everyone else on the landing page.
#[get("/")]
pub async fn home(
    upload_service: web::Data<UploadService>,
    query: web::Query<SortQuery>,
    req: HttpRequest,
) -> Result<success::Success<HomePage>, error::Error> {
    let viewer = get_viewer(&req);
    let requested = query.sort_by.as_deref();

    let page = match &viewer {
        Some(v) if v.role.is_staff() && !v.role.is_superuser() => {
            HomePage::SiteStaff(upload_service.staff_listing(Some(v), requested).await?)
        }
        Some(v) => HomePage::Mainpage(upload_service.user_listing(Some(v), requested).await?),
        None => HomePage::Landing,
    };
    Ok(success::Success::ok(Some(page)))
}

#[get("/mainpage")]
pub async fn mainpage(
    upload_service: web::Data<UploadService>,
    query: web::Query<SortQuery>,
    req: HttpRequest,
) -> Result<success::Success<ListingPage>, error::Error> {
    let viewer = get_viewer(&req);
    let page = upload_service.user_listing(viewer.as_ref(), query.sort_by.as_deref()).await?;
    Ok(success::Success::ok(Some(page)))
}

#[get("/site-staff")]
pub async fn site_staff(
    upload_service: web::Data<UploadService>,
    query: web::Query<SortQuery>,
    req: HttpRequest,
) -> Result<success::Success<ListingPage>, error::Error> {
    let viewer = get_viewer(&req);
    let page = upload_service.staff_listing(viewer.as_ref(), query.sort_by.as_deref()).await?;
    Ok(success::Success::ok(Some(page)))
}

/// Ends the session (forgetting its sort key) and shows the landing page.
#[get("/logout")]
pub async fn logout(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<HomePage>, error::Error> {
    let refresh_token = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());
    let viewer = get_viewer(&req);
    user_service.sign_out(refresh_token, viewer.as_ref()).await?;

    Ok(success::Success::ok(Some(HomePage::Landing))
        .message("Signed out")
        .cookies(vec![expired_refresh_cookie()]))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;

    use crate::modules::session::store::SessionStore;
    use crate::modules::upload::schema::{Priority, UploadStatus};
    use crate::modules::user::schema::UserRole;
    use crate::test::{bearer, test_app, upload_fixture, TestState};

    fn seed(state: &TestState, owner: Option<uuid::Uuid>, priority: i16, status: UploadStatus) {
        let mut upload = upload_fixture(0, owner);
        upload.priority = Priority::new(priority).unwrap();
        upload.status = status;
        state.repo.insert(upload);
    }

    fn priorities(body: &Value) -> Vec<i64> {
        body["data"]["uploads"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["priority"].as_i64().unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn landing_depends_on_role() {
        let state = TestState::new();
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["page"], "landing");

        let cases = [
            (UserRole::Staff, "site_staff"),
            (UserRole::Admin, "mainpage"),
            (UserRole::User, "mainpage"),
        ];
        for (role, expected) in cases {
            let (_, auth) = bearer(&state, role);
            let req = test::TestRequest::get().uri("/").insert_header(("Authorization", auth)).to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"]["page"], expected);
        }
    }

    #[actix_web::test]
    async fn mainpage_sorts_by_priority() {
        let state = TestState::new();
        let app = test_app!(state);
        let (owner, auth) = bearer(&state, UserRole::User);
        for priority in [3, 1, 2] {
            seed(&state, Some(owner.sub), priority, UploadStatus::New);
        }
        seed(&state, None, 5, UploadStatus::New);

        let req = test::TestRequest::get()
            .uri("/mainpage?sort_by=priority")
            .insert_header(("Authorization", auth))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["sort_by"], "priority");
        assert_eq!(priorities(&body), vec![3, 2, 1]);
    }

    #[actix_web::test]
    async fn mainpage_hides_resolved() {
        let state = TestState::new();
        let app = test_app!(state);
        let (owner, auth) = bearer(&state, UserRole::User);
        seed(&state, Some(owner.sub), 3, UploadStatus::InProgress);
        seed(&state, Some(owner.sub), 2, UploadStatus::New);
        seed(&state, Some(owner.sub), 1, UploadStatus::Resolved);

        let req = test::TestRequest::get()
            .uri("/mainpage?sort_by=hide_resolved")
            .insert_header(("Authorization", auth))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(priorities(&body), vec![3, 2]);
    }

    #[actix_web::test]
    async fn anonymous_mainpage_is_empty() {
        let state = TestState::new();
        let app = test_app!(state);
        seed(&state, None, 1, UploadStatus::New);

        let req = test::TestRequest::get().uri("/mainpage").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["uploads"], Value::Array(Vec::new()));
    }

    #[actix_web::test]
    async fn site_staff_lists_everything_for_staff_only() {
        let state = TestState::new();
        let app = test_app!(state);
        seed(&state, Some(uuid::Uuid::now_v7()), 3, UploadStatus::New);
        seed(&state, Some(uuid::Uuid::now_v7()), 1, UploadStatus::New);
        seed(&state, None, 2, UploadStatus::New);

        let (_, staff) = bearer(&state, UserRole::Staff);
        let req = test::TestRequest::get()
            .uri("/site-staff?sort_by=priority")
            .insert_header(("Authorization", staff))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(priorities(&body), vec![3, 2, 1]);

        let (_, user) = bearer(&state, UserRole::User);
        let req =
            test::TestRequest::get().uri("/site-staff").insert_header(("Authorization", user)).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn sort_key_survives_requests_until_logout() {
        let state = TestState::new();
        let app = test_app!(state);
        let (owner, auth) = bearer(&state, UserRole::User);
        for priority in [3, 1, 2] {
            seed(&state, Some(owner.sub), priority, UploadStatus::New);
        }

        let req = test::TestRequest::get()
            .uri("/mainpage?sort_by=priority")
            .insert_header(("Authorization", auth.clone()))
            .to_request();
        test::call_service(&app, req).await;

        let req =
            test::TestRequest::get().uri("/mainpage").insert_header(("Authorization", auth.clone())).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["sort_by"], "priority");
        assert_eq!(priorities(&body), vec![3, 2, 1]);

        let req =
            test::TestRequest::get().uri("/logout").insert_header(("Authorization", auth.clone())).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["page"], "landing");
        assert_eq!(state.sessions.sort_key(&owner.session_id()).await.unwrap(), None);

        let req = test::TestRequest::get()
            .uri("/mainpage?sort_by=priority")
            .insert_header(("Authorization", auth))
            .to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.sessions.sort_key(&owner.session_id()).await.unwrap(), None);

        let (_, fresh) = bearer(&state, UserRole::User);
        let req = test::TestRequest::get().uri("/mainpage").insert_header(("Authorization", fresh)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["sort_by"], "most_recent");
    }
}

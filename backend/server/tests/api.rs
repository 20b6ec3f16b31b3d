use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Duration;
use clinic::{config::Config, database::MemoryStore, routes::router, seed::seed, state::State};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    state: Arc<State>,
}

impl TestApp {
    async fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "CLINIC_BCRYPT_COST" => Some("4".to_string()),
            _ => None,
        })
        .unwrap();

        let state = State::with_store(config, Arc::new(MemoryStore::new())).unwrap();
        seed(&state).await.unwrap();

        Self {
            router: router(state.clone()),
            state,
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, token, None).await
    }

    async fn register(&self, name: &str, cpf: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "cpf": cpf, "birth_date": "15/04/1988" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        (
            body["access_token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn admin_token(&self) -> String {
        self.staff_token("admin@odonto.com", "admin123").await
    }

    async fn staff_token(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/admin/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        body["access_token"].as_str().unwrap().to_string()
    }

    async fn book(&self, token: &str, date: &str, time: &str) -> (StatusCode, Value) {
        self.post(
            "/api/appointments",
            Some(token),
            json!({
                "unit_id": "unit-1",
                "service_id": "service-1",
                "doctor_id": "doctor-1",
                "date": date,
                "time": time,
            }),
        )
        .await
    }
}

#[tokio::test]
async fn test_root_and_health() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));

    let (status, body) = app.get("/api/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Dental Clinic API");
}

#[tokio::test]
async fn test_patient_register_login_me() {
    let app = TestApp::new().await;
    let (token, id) = app.register("Maria Souza", "111.222.333-44").await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Outra", "cpf": "111.222.333-44", "birth_date": "01/01/1990" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "CPF já cadastrado");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "cpf": "111.222.333-44", "birth_date": "01/01/1990" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "CPF ou data de nascimento inválidos");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "cpf": "111.222.333-44", "birth_date": "15/04/1988" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["name"], "Maria Souza");
}

#[tokio::test]
async fn test_register_requires_fields() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "  ", "cpf": "1", "birth_date": "01/01/1990" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Campo obrigatório: name");
}

#[tokio::test]
async fn test_token_checks() {
    let app = TestApp::new().await;
    let (patient, _) = app.register("Maria Souza", "123").await;

    let (status, body) = app.get("/api/appointments", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Token inválido");

    let (status, _) = app.get("/api/appointments", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/admin/patients", Some(&patient)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Acesso negado");
}

#[tokio::test]
async fn test_public_catalog() {
    let app = TestApp::new().await;

    let (_, units) = app.get("/api/units", None).await;
    assert_eq!(units.as_array().unwrap().len(), 2);

    let (_, services) = app.get("/api/services", None).await;
    let services = services.as_array().unwrap();
    assert_eq!(services.len(), 7);
    assert!(services.iter().all(|s| s.get("price").is_none()));

    let (_, doctors) = app.get("/api/doctors?unit_id=unit-1", None).await;
    let doctors = doctors.as_array().unwrap();
    assert_eq!(doctors.len(), 2);
    assert!(doctors.iter().all(|d| d["unit_id"] == "unit-1"));

    let (_, doctors) = app.get("/api/doctors", None).await;
    assert_eq!(doctors.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_admin_catalog_crud() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, services) = app.get("/api/admin/services", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(services.as_array().unwrap().iter().all(|s| s.get("price").is_some()));

    let (status, unit) = app
        .post(
            "/api/admin/units",
            Some(&admin),
            json!({ "name": "Unidade Leste", "address": "Rua Leste, 1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let unit_id = unit["id"].as_str().unwrap().to_string();

    let (status, unit) = app
        .put(
            &format!("/api/admin/units/{unit_id}"),
            Some(&admin),
            json!({ "phone": "(92) 3333-0000" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unit["phone"], "(92) 3333-0000");
    assert_eq!(unit["name"], "Unidade Leste");

    let (status, _) = app
        .delete(&format!("/api/admin/units/{unit_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .delete(&format!("/api/admin/units/{unit_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Unidade não encontrada");

    let (status, _) = app
        .put(
            "/api/admin/doctors/missing",
            Some(&admin),
            json!({ "name": "Ninguém" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_rules() {
    let app = TestApp::new().await;
    let (token, _) = app.register("Maria Souza", "123").await;

    let (status, appointment) = app.book(&token, "10/03/2099", "09:00").await;
    assert_eq!(status, StatusCode::OK, "{appointment}");
    assert_eq!(appointment["status"], "agendado");
    assert_eq!(appointment["service_price"], 150.0);
    assert_eq!(appointment["paid_value"], 0.0);
    assert_eq!(appointment["user_name"], "Maria Souza");
    assert_eq!(appointment["doctor_name"], "Dr. Carlos Silva");

    let (status, body) = app.book(&token, "10/03/2099", "09:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Este horário já está ocupado para o profissional selecionado"
    );

    let (status, body) = app.book(&token, "10/03/2000", "09:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Não é possível agendar em horários passados");

    let (status, body) = app.book(&token, "31/02/2099", "09:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Data ou horário inválido");

    let (status, body) = app
        .post(
            "/api/appointments",
            Some(&token),
            json!({
                "unit_id": "unit-1",
                "service_id": "service-1",
                "doctor_id": "doctor-99",
                "date": "10/03/2099",
                "time": "10:00",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Dados inválidos");
}

#[tokio::test]
async fn test_slot_taken_in_any_spelling() {
    let app = TestApp::new().await;
    let (token, _) = app.register("Maria Souza", "123").await;

    let (status, appointment) = app.book(&token, " 10/3/2099", "9:00 ").await;
    assert_eq!(status, StatusCode::OK, "{appointment}");
    assert_eq!(appointment["date"], "10/03/2099");
    assert_eq!(appointment["time"], "09:00");

    for (date, time) in [
        ("10/03/2099", "09:00"),
        ("10/03/2099", "9:00"),
        ("10/3/2099", "09:00"),
        (" 10/03/2099", "09:00 "),
    ] {
        let (status, body) = app.book(&token, date, time).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{date:?} {time:?}");
        assert_eq!(
            body["detail"],
            "Este horário já está ocupado para o profissional selecionado"
        );
    }

    for date in ["10/03/2099", "10/3/2099"] {
        let (_, body) = app
            .get(
                &format!("/api/appointments/booked-slots?doctor_id=doctor-1&date={date}"),
                None,
            )
            .await;
        assert_eq!(body["booked_times"], json!(["09:00"]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_take_one_slot() {
    let app = Arc::new(TestApp::new().await);

    let mut tokens = Vec::new();
    for i in 0..8 {
        let (token, _) = app.register("Paciente", &format!("cpf-{i}")).await;
        tokens.push(token);
    }

    let handles: Vec<_> = tokens
        .into_iter()
        .map(|token| {
            let app = app.clone();
            tokio::spawn(async move { app.book(&token, "10/03/2099", "09:00").await.0 })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => accepted += 1,
            status => assert_eq!(status, StatusCode::BAD_REQUEST),
        }
    }
    assert_eq!(accepted, 1);

    let (_, body) = app
        .get(
            "/api/appointments/booked-slots?doctor_id=doctor-1&date=10/03/2099",
            None,
        )
        .await;
    assert_eq!(body["booked_times"], json!(["09:00"]));
}

#[tokio::test]
async fn test_cancel_frees_slot() {
    let app = TestApp::new().await;
    let (maria, _) = app.register("Maria Souza", "123").await;
    let (joao, _) = app.register("João Lima", "456").await;

    let (_, appointment) = app.book(&maria, "10/03/2099", "09:00").await;
    let id = appointment["id"].as_str().unwrap().to_string();

    let slots = "/api/appointments/booked-slots?doctor_id=doctor-1&date=10/03/2099";
    let (_, body) = app.get(slots, None).await;
    assert_eq!(body["booked_times"], json!(["09:00"]));

    let (status, _) = app
        .delete(&format!("/api/appointments/{id}"), Some(&joao))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .delete(&format!("/api/appointments/{id}"), Some(&maria))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Agendamento cancelado");

    let (status, body) = app
        .delete(&format!("/api/appointments/{id}"), Some(&maria))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Agendamento não encontrado");

    let (_, body) = app.get(slots, None).await;
    assert_eq!(body["booked_times"], json!([]));

    let (status, _) = app.book(&joao, "10/03/2099", "09:00").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_own_appointments_and_reminders() {
    let app = TestApp::new().await;
    let (token, _) = app.register("Maria Souza", "123").await;

    let soon = app.state.now() + Duration::hours(2);
    let (date, time) = (
        soon.format("%d/%m/%Y").to_string(),
        soon.format("%H:%M").to_string(),
    );

    let (status, _) = app.book(&token, "10/03/2099", "09:00").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.book(&token, &date, &time).await;
    assert_eq!(status, StatusCode::OK);

    let (_, own) = app.get("/api/appointments", Some(&token)).await;
    let own = own.as_array().unwrap();
    assert_eq!(own.len(), 2);
    assert_eq!(own[0]["date"], date.as_str());

    let (_, body) = app.get("/api/appointments/reminders", Some(&token)).await;
    let reminders = body["reminders"].as_array().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0]["time"], time.as_str());
}

#[tokio::test]
async fn test_completion_feeds_financials() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (token, user_id) = app.register("Maria Souza", "123").await;

    let (_, first) = app.book(&token, "10/03/2099", "09:00").await;
    let (_, second) = app.book(&token, "11/03/2099", "09:00").await;

    let mut notifications = app.state.hub.subscribe();

    let (status, updated) = app
        .put(
            &format!("/api/admin/appointments/{}", first["id"].as_str().unwrap()),
            Some(&admin),
            json!({ "status": "concluido" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["paid_value"], 150.0);
    assert!(updated.get("completed_at").is_some());

    let admin_event = notifications.recv().await.unwrap();
    assert_eq!(admin_event.event, "appointment_updated");
    let patient_event = notifications.recv().await.unwrap();
    assert_eq!(patient_event.event, "appointment_status_changed");
    assert_eq!(patient_event.room.to_string(), format!("patient_{user_id}"));

    let (_, updated) = app
        .put(
            &format!("/api/admin/appointments/{}", second["id"].as_str().unwrap()),
            Some(&admin),
            json!({ "status": "concluido", "paid_value": 90.0 }),
        )
        .await;
    assert_eq!(updated["paid_value"], 90.0);

    let (status, summary) = app
        .get("/api/admin/financial/summary?month=3&year=2099", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_revenue"], 240.0);
    assert_eq!(summary["total_appointments"], 2);
    assert_eq!(summary["average_ticket"], 120.0);
    assert_eq!(summary["clinic_breakdown"][0]["unit_name"], "Unidade Sinditur - Flores");

    let (_, daily) = app
        .get("/api/admin/financial/daily?date=11/03/2099", Some(&admin))
        .await;
    assert_eq!(daily["total_revenue"], 90.0);

    let (_, listed) = app
        .get("/api/admin/appointments?status=concluido", Some(&admin))
        .await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["date"], "11/03/2099");

    let (status, _) = app
        .put(
            "/api/admin/appointments/missing",
            Some(&admin),
            json!({ "notes": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_financial_summary_rejects_invalid_month() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    for month in [0, 13] {
        let (status, body) = app
            .get(
                &format!("/api/admin/financial/summary?month={month}&year=2099"),
                Some(&admin),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Mês inválido");
    }

    let (status, _) = app
        .get("/api/admin/financial/summary?month=12&year=2099", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_inventory_movements() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, item) = app
        .post(
            "/api/admin/inventory",
            Some(&admin),
            json!({ "name": "Luvas", "quantity": 10, "unit": "caixa", "min_quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let item_id = item["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/admin/inventory/movement",
            Some(&admin),
            json!({ "item_id": item_id, "type": "saida", "quantity": 15 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Quantidade insuficiente em estoque");

    let (status, movement) = app
        .post(
            "/api/admin/inventory/movement",
            Some(&admin),
            json!({ "item_id": item_id, "type": "saida", "quantity": 4, "doctor_id": "doctor-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movement["doctor_name"], "Dr. Carlos Silva");
    assert_eq!(movement["created_by"], "Administrador");

    let (_, items) = app.get("/api/admin/inventory", Some(&admin)).await;
    assert_eq!(items[0]["quantity"], 6);

    let (_, movements) = app
        .get(
            &format!("/api/admin/inventory/movements?item_id={item_id}"),
            Some(&admin),
        )
        .await;
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements.iter().any(|m| m["notes"] == "Cadastro inicial"));

    let (_, outbound) = app
        .get("/api/admin/inventory/movements?type=saida", Some(&admin))
        .await;
    assert_eq!(outbound.as_array().unwrap().len(), 1);

    let (status, body) = app
        .post(
            "/api/admin/inventory/movement",
            Some(&admin),
            json!({ "item_id": "missing", "type": "entrada", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Item não encontrado");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_outbound_movements_respect_stock() {
    let app = Arc::new(TestApp::new().await);
    let admin = app.admin_token().await;

    let (_, item) = app
        .post(
            "/api/admin/inventory",
            Some(&admin),
            json!({ "name": "Anestésico", "quantity": 3, "unit": "frasco", "min_quantity": 1 }),
        )
        .await;
    let item_id = item["id"].as_str().unwrap().to_string();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            let admin = admin.clone();
            let item_id = item_id.clone();
            tokio::spawn(async move {
                app.post(
                    "/api/admin/inventory/movement",
                    Some(&admin),
                    json!({ "item_id": item_id, "type": "saida", "quantity": 1 }),
                )
                .await
                .0
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => accepted += 1,
            status => assert_eq!(status, StatusCode::BAD_REQUEST),
        }
    }
    assert_eq!(accepted, 3);

    let (_, items) = app.get("/api/admin/inventory", Some(&admin)).await;
    assert_eq!(items[0]["quantity"], 0);

    let (_, outbound) = app
        .get(
            &format!("/api/admin/inventory/movements?item_id={item_id}&type=saida"),
            Some(&admin),
        )
        .await;
    assert_eq!(outbound.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_staff_permissions() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (status, created) = app
        .post(
            "/api/admin/staff",
            Some(&admin),
            json!({
                "name": "Bia",
                "email": "Bia@Odonto.com",
                "password": "segredo1",
                "role": "receptionist",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["email"], "bia@odonto.com");
    assert!(created.get("password_hash").is_none());
    let bia_id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/admin/staff",
            Some(&admin),
            json!({ "name": "Outra", "email": "bia@odonto.com", "password": "x", "role": "doctor" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email já cadastrado");

    let bia = app.staff_token("bia@odonto.com", "segredo1").await;

    let (status, _) = app
        .post(
            "/api/admin/staff",
            Some(&bia),
            json!({ "name": "Zé", "email": "ze@odonto.com", "password": "x", "role": "doctor" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(
            &format!("/api/admin/staff/{bia_id}"),
            Some(&bia),
            json!({ "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &format!("/api/admin/staff/{bia_id}"),
            Some(&bia),
            json!({ "name": "Beatriz" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Beatriz");

    let (status, _) = app
        .put(
            &format!("/api/admin/staff/{bia_id}"),
            Some(&admin),
            json!({ "active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/admin/staff", Some(&bia)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Usuário inativo");

    let (status, _) = app
        .delete(&format!("/api/admin/staff/{bia_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/admin/auth/login",
            None,
            json!({ "email": "bia@odonto.com", "password": "segredo1" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patient_detail_and_update() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (token, id) = app.register("Maria Souza", "123").await;

    let (_, kept) = app.book(&token, "10/03/2099", "09:00").await;
    let (_, dropped) = app.book(&token, "11/03/2099", "09:00").await;
    app.delete(
        &format!("/api/appointments/{}", dropped["id"].as_str().unwrap()),
        Some(&token),
    )
    .await;

    let (status, detail) = app
        .get(&format!("/api/admin/patients/{id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["patient"]["name"], "Maria Souza");
    assert_eq!(detail["appointments"].as_array().unwrap().len(), 2);
    assert_eq!(detail["upcoming"][0]["id"], kept["id"]);
    assert_eq!(detail["history"][0]["id"], dropped["id"]);

    let (status, body) = app
        .put(&format!("/api/admin/patients/{id}"), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Nenhum dado para atualizar");

    let (status, body) = app
        .put(
            &format!("/api/admin/patients/{id}"),
            Some(&admin),
            json!({ "phone": "(92) 98888-0000", "company": "Sinditur" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "(92) 98888-0000");
    assert_eq!(body["cpf"], "123");

    let (status, body) = app
        .get("/api/admin/patients/missing", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Paciente não encontrado");
}

#[tokio::test]
async fn test_documents() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, patient_id) = app.register("Maria Souza", "111.222.333-44").await;

    let (_, templates) = app.get("/api/admin/document-templates", Some(&admin)).await;
    assert_eq!(templates.as_array().unwrap().len(), 4);
    assert_eq!(templates[0]["type"], "atestado");

    let (status, body) = app
        .put(
            "/api/admin/document-templates/laudo",
            Some(&admin),
            json!({ "content": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Template não encontrado");

    let (status, _) = app
        .put(
            "/api/admin/document-templates/receita",
            Some(&admin),
            json!({ "content": "Receita de {NOME_PACIENTE}: {MEDICAMENTOS} {DESCONHECIDO}" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, document) = app
        .post(
            "/api/admin/documents/generate",
            Some(&admin),
            json!({
                "template_type": "receita",
                "patient_id": patient_id,
                "doctor_id": "doctor-1",
                "custom_fields": { "medicamentos": "Amoxicilina 500mg" },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        document["content"],
        "Receita de Maria Souza: Amoxicilina 500mg {DESCONHECIDO}"
    );
    assert_eq!(document["doctor_cro"], "AM-12345");

    let (status, body) = app
        .post(
            "/api/admin/documents/generate",
            Some(&admin),
            json!({ "template_type": "atestado", "patient_id": "missing", "doctor_id": "doctor-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Paciente ou doutor não encontrado");

    let (status, pdf) = app
        .post(
            "/api/admin/documents/generate-pdf",
            Some(&admin),
            json!({ "template_type": "atestado", "patient_id": patient_id, "doctor_id": "doctor-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let filename = pdf["filename"].as_str().unwrap();
    assert!(filename.starts_with("atestado_Maria_Souza_"));
    assert!(filename.ends_with(".pdf"));

    let bytes = STANDARD.decode(pdf["pdf_base64"].as_str().unwrap()).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

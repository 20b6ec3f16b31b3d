//! Smoke client for a running server: walks the patient booking flow end to end.
use anyhow::{Context, Result, bail, ensure};
use chrono::{Duration, Utc};
use clap::Parser;
use records::{Appointment, Doctor, PublicService, Unit};
use reqwest::{Client, Response};
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "tester")]
#[command(about = "Runs the booking flow against a clinic backend")]
struct Cli {
    /// Server root, e.g. http://localhost:8001
    #[arg(default_value = "http://localhost:8001")]
    base_url: String,
}

struct Api {
    client: Client,
    base: String,
    token: Option<String>,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base.trim_end_matches('/'))
    }

    async fn check(response: Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            bail!("{status}: {body}");
        }

        Ok(body)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        Self::check(request.send().await?).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let mut request = self.client.post(self.url(path)).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        Self::check(request.send().await?).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let mut request = self.client.delete(self.url(path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        Self::check(request.send().await?).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut api = Api {
        client: Client::new(),
        base: cli.base_url,
        token: None,
    };

    let health = api.get("/health").await.context("health check")?;
    println!("health: {health}");

    let cpf = format!("{:011}", Utc::now().timestamp_millis() % 100_000_000_000);
    let patient = json!({ "name": "Paciente Teste", "cpf": cpf, "birth_date": "01/01/1990" });

    api.post("/auth/register", patient)
        .await
        .context("register")?;
    let login = api
        .post("/auth/login", json!({ "cpf": cpf, "birth_date": "01/01/1990" }))
        .await
        .context("login")?;
    api.token = login["access_token"].as_str().map(str::to_string);
    ensure!(api.token.is_some(), "login returned no token");
    println!("logged in as {cpf}");

    let units: Vec<Unit> = serde_json::from_value(api.get("/units").await?)?;
    let services: Vec<PublicService> = serde_json::from_value(api.get("/services").await?)?;
    let unit = units.first().context("no units")?;
    let service = services.first().context("no services")?;

    let doctors: Vec<Doctor> =
        serde_json::from_value(api.get(&format!("/doctors?unit_id={}", unit.id)).await?)?;
    let doctor = doctors.first().context("no doctors in unit")?;
    println!(
        "{} units, {} services, {} doctors at {}",
        units.len(),
        services.len(),
        doctors.len(),
        unit.name
    );

    let date = (Utc::now() + Duration::days(1)).format("%d/%m/%Y").to_string();
    let slots = api
        .get(&format!("/appointments/booked-slots?doctor_id={}&date={date}", doctor.id))
        .await?;
    let taken: Vec<String> = serde_json::from_value(slots["booked_times"].clone())?;

    let time = (8..18)
        .map(|hour| format!("{hour:02}:00"))
        .find(|time| !taken.contains(time))
        .context("doctor fully booked tomorrow")?;

    let appointment: Appointment = serde_json::from_value(
        api.post(
            "/appointments",
            json!({
                "unit_id": unit.id,
                "service_id": service.id,
                "doctor_id": doctor.id,
                "date": date,
                "time": time,
            }),
        )
        .await
        .context("booking")?,
    )?;
    println!("booked {} at {date} {time}", appointment.id);

    let slots = api
        .get(&format!("/appointments/booked-slots?doctor_id={}&date={date}", doctor.id))
        .await?;
    ensure!(
        slots["booked_times"]
            .as_array()
            .is_some_and(|times| times.contains(&json!(time))),
        "booked slot not listed"
    );

    let retry = api
        .post(
            "/appointments",
            json!({
                "unit_id": unit.id,
                "service_id": service.id,
                "doctor_id": doctor.id,
                "date": date,
                "time": time,
            }),
        )
        .await;
    ensure!(retry.is_err(), "double booking was accepted");
    println!("double booking refused");

    api.delete(&format!("/appointments/{}", appointment.id))
        .await
        .context("cancel")?;
    println!("cancelled {}", appointment.id);

    println!("all checks passed");
    Ok(())
}

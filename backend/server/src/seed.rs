//! Starter catalog, document templates and the first administrator.
use chrono::Utc;
use records::{Doctor, DocumentTemplate, Service, Staff, StaffRole, TemplateKind, Unit};
use tracing::info;

use crate::{
    auth::hash_password, documents::default_template, error::AppError, state::State,
    utils::new_id,
};

fn units() -> Vec<Unit> {
    [
        ("unit-1", "Unidade Sinditur - Flores", "Rua das Flores, 123 - Flores", "(92) 3333-1111"),
        ("unit-2", "Unidade Centro", "Av. Central, 456 - Centro", "(92) 3333-2222"),
    ]
    .into_iter()
    .map(|(id, name, address, phone)| Unit {
        id: id.to_string(),
        name: name.to_string(),
        address: address.to_string(),
        phone: phone.to_string(),
    })
    .collect()
}

fn services() -> Vec<Service> {
    [
        ("service-1", "Limpeza Dental", "Limpeza completa dos dentes e gengivas", 30, 150.0),
        ("service-2", "Clareamento", "Clareamento dental profissional", 60, 500.0),
        ("service-3", "Restauração", "Restauração dentária com resina", 45, 200.0),
        ("service-4", "Ortodontia", "Consulta e acompanhamento ortodôntico", 30, 180.0),
        ("service-5", "Extração", "Extração de dente simples", 45, 250.0),
        ("service-6", "Canal", "Tratamento de canal dentário", 90, 600.0),
        ("service-7", "Consulta Avaliação", "Consulta inicial de avaliação", 30, 100.0),
    ]
    .into_iter()
    .map(|(id, name, description, duration_minutes, price)| Service {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        duration_minutes,
        price,
    })
    .collect()
}

fn weekdays(days: &[&str]) -> Vec<String> {
    days.iter().map(|d| d.to_string()).collect()
}

fn doctors() -> Vec<Doctor> {
    vec![
        Doctor {
            id: "doctor-1".to_string(),
            name: "Dr. Carlos Silva".to_string(),
            specialty: "Clínico Geral".to_string(),
            unit_id: "unit-1".to_string(),
            cro: "AM-12345".to_string(),
            phone: "(92) 99999-1111".to_string(),
            email: "carlos@odonto.com".to_string(),
            photo_base64: None,
            bio: "10 anos de experiência em odontologia geral".to_string(),
            available_days: weekdays(&["Segunda", "Terça", "Quarta", "Quinta", "Sexta"]),
        },
        Doctor {
            id: "doctor-2".to_string(),
            name: "Dra. Ana Santos".to_string(),
            specialty: "Ortodontista".to_string(),
            unit_id: "unit-1".to_string(),
            cro: "AM-12346".to_string(),
            phone: "(92) 99999-2222".to_string(),
            email: "ana@odonto.com".to_string(),
            photo_base64: None,
            bio: "Especialista em aparelhos ortodônticos".to_string(),
            available_days: weekdays(&["Segunda", "Quarta", "Sexta"]),
        },
        Doctor {
            id: "doctor-3".to_string(),
            name: "Dr. Pedro Oliveira".to_string(),
            specialty: "Endodontista".to_string(),
            unit_id: "unit-2".to_string(),
            cro: "AM-12347".to_string(),
            phone: "(92) 99999-3333".to_string(),
            email: "pedro@odonto.com".to_string(),
            photo_base64: None,
            bio: "Especialista em tratamento de canal".to_string(),
            available_days: weekdays(&["Terça", "Quinta", "Sexta"]),
        },
        Doctor {
            id: "doctor-4".to_string(),
            name: "Dra. Maria Costa".to_string(),
            specialty: "Clínico Geral".to_string(),
            unit_id: "unit-2".to_string(),
            cro: "AM-12348".to_string(),
            phone: "(92) 99999-4444".to_string(),
            email: "maria@odonto.com".to_string(),
            photo_base64: None,
            bio: "8 anos de experiência em procedimentos estéticos".to_string(),
            available_days: weekdays(&["Segunda", "Terça", "Quarta", "Quinta"]),
        },
    ]
}

async fn seed_catalog(state: &State) -> Result<(), AppError> {
    for unit in units() {
        state.db.save(&unit).await?;
    }
    for service in services() {
        state.db.save(&service).await?;
    }
    for doctor in doctors() {
        state.db.save(&doctor).await?;
    }

    info!("Catalog seeded");
    Ok(())
}

/// Missing templates get their default text; edited ones are left alone.
pub async fn ensure_templates(state: &State) -> Result<(), AppError> {
    for kind in TemplateKind::ALL {
        if state.db.get::<DocumentTemplate>(kind.as_str()).await?.is_some() {
            continue;
        }

        state
            .db
            .save(&DocumentTemplate {
                id: new_id(),
                kind,
                content: default_template(kind).to_string(),
                updated_at: Utc::now(),
            })
            .await?;

        info!("Template {kind} created");
    }

    Ok(())
}

pub async fn ensure_admin(state: &State) -> Result<(), AppError> {
    let email = state.config.admin_email.trim().to_lowercase();

    if state
        .db
        .find_one::<Staff, _>(|s| s.email.to_lowercase() == email)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let admin = Staff {
        id: new_id(),
        name: "Administrador".to_string(),
        email,
        password_hash: hash_password(
            state.config.admin_password.clone(),
            state.config.bcrypt_cost,
        )
        .await?,
        role: StaffRole::Admin,
        permissions: vec!["all".to_string()],
        active: true,
        created_at: Utc::now(),
    };
    state.db.save(&admin).await?;

    info!("Admin user created: {}", admin.email);
    Ok(())
}

/// Idempotent: the catalog is only written into an empty store.
pub async fn seed(state: &State) -> Result<(), AppError> {
    if state.db.count::<Unit>().await? == 0 {
        seed_catalog(state).await?;
    } else {
        info!("Catalog already seeded");
    }

    ensure_templates(state).await?;
    ensure_admin(state).await
}

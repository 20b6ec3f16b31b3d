//! # Clinical documents
//!
//! Staff keep one editable text template per document type. Generating a
//! document fills `{PLACEHOLDER}` markers from the patient, the doctor, the
//! doctor's unit and the free-form fields sent with the request. Markers that
//! are not known are left untouched so a typo stays visible in the output.
use std::{collections::HashMap, sync::LazyLock};

use chrono::NaiveDate;
use records::{Doctor, Patient, TemplateKind, Unit};
use regex::{Captures, Regex};
use serde_json::Value;

use crate::utils::{format_date, long_date};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Z_]+)\}").expect("placeholder pattern is valid"));

pub fn default_template(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Atestado => ATESTADO,
        TemplateKind::Afastamento => AFASTAMENTO,
        TemplateKind::TermoConsentimento => TERMO_CONSENTIMENTO,
        TemplateKind::Receita => RECEITA,
    }
}

const ATESTADO: &str = "ATESTADO ODONTOLÓGICO

Atesto para os devidos fins que o(a) paciente {NOME_PACIENTE}, portador(a) do CPF {CPF_PACIENTE}, compareceu a esta clínica odontológica na data de {DATA} para realização de procedimento odontológico, necessitando de afastamento de suas atividades por {DIAS_AFASTAMENTO} dia(s).

{CIDADE}, {DATA_EXTENSO}

_________________________________
{NOME_DOUTOR}
CRO: {CRO_DOUTOR}
{NOME_CLINICA}";

const AFASTAMENTO: &str = "DECLARAÇÃO DE AFASTAMENTO

Declaro para os devidos fins que o(a) paciente {NOME_PACIENTE}, portador(a) do CPF {CPF_PACIENTE}, está em tratamento odontológico nesta clínica desde {DATA_INICIO} com previsão de término em {DATA_FIM}.

Durante este período, o paciente necessita de afastamento de suas atividades laborais para realização dos procedimentos necessários.

Procedimentos: {PROCEDIMENTOS}

{CIDADE}, {DATA_EXTENSO}

_________________________________
{NOME_DOUTOR}
CRO: {CRO_DOUTOR}
{NOME_CLINICA}";

const TERMO_CONSENTIMENTO: &str = "TERMO DE CONSENTIMENTO LIVRE E ESCLARECIDO

Eu, {NOME_PACIENTE}, portador(a) do CPF {CPF_PACIENTE}, declaro que fui devidamente informado(a) pelo(a) Dr(a). {NOME_DOUTOR}, CRO {CRO_DOUTOR}, sobre o procedimento de {PROCEDIMENTO} a ser realizado.

Declaro que:
1. Fui informado(a) sobre os riscos e benefícios do procedimento;
2. Tive a oportunidade de fazer perguntas e todas foram respondidas satisfatoriamente;
3. Compreendi as instruções pré e pós-operatórias;
4. Autorizo a realização do procedimento proposto;
5. Autorizo o uso de imagens para fins didáticos e científicos, preservando minha identidade.

{CIDADE}, {DATA_EXTENSO}

_________________________________
{NOME_PACIENTE}
Paciente

_________________________________
{NOME_DOUTOR}
CRO: {CRO_DOUTOR}";

const RECEITA: &str = "RECEITUÁRIO

Paciente: {NOME_PACIENTE}
CPF: {CPF_PACIENTE}
Data: {DATA}

PRESCRIÇÃO:

{MEDICAMENTOS}

Observações: {OBSERVACOES}

_________________________________
{NOME_DOUTOR}
CRO: {CRO_DOUTOR}
{NOME_CLINICA}
{ENDERECO_CLINICA}";

pub struct Context<'a> {
    pub patient: &'a Patient,
    pub doctor: &'a Doctor,
    pub unit: Option<&'a Unit>,
    pub clinic_name: &'a str,
    pub city: &'a str,
    pub today: NaiveDate,
    pub custom_fields: &'a HashMap<String, Value>,
}

impl Context<'_> {
    fn custom(&self, key: &str, default: &str) -> String {
        match self.custom_fields.get(key) {
            None | Some(Value::Null) => default.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn values(&self) -> HashMap<&'static str, String> {
        let today = format_date(self.today);

        HashMap::from([
            ("NOME_PACIENTE", self.patient.name.clone()),
            ("CPF_PACIENTE", self.patient.cpf.clone()),
            ("NOME_DOUTOR", self.doctor.name.clone()),
            ("CRO_DOUTOR", self.doctor.cro.clone()),
            ("DATA", today.clone()),
            ("DATA_EXTENSO", long_date(self.today)),
            ("CIDADE", self.city.to_string()),
            ("NOME_CLINICA", self.clinic_name.to_string()),
            (
                "ENDERECO_CLINICA",
                self.unit.map(|u| u.address.clone()).unwrap_or_default(),
            ),
            ("DIAS_AFASTAMENTO", self.custom("dias_afastamento", "1")),
            ("DATA_INICIO", self.custom("data_inicio", &today)),
            ("DATA_FIM", self.custom("data_fim", "")),
            ("PROCEDIMENTOS", self.custom("procedimentos", "")),
            ("PROCEDIMENTO", self.custom("procedimento", "")),
            ("MEDICAMENTOS", self.custom("medicamentos", "")),
            ("OBSERVACOES", self.custom("observacoes", "")),
        ])
    }
}

/// Single pass, so substituted values are never re-scanned for markers.
pub fn render(template: &str, values: &HashMap<&'static str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// `atestado_Maria_Souza_20250310.pdf`
pub fn pdf_filename(kind: TemplateKind, patient_name: &str, today: NaiveDate) -> String {
    format!(
        "{}_{}_{}.pdf",
        kind,
        patient_name.replace(' ', "_"),
        today.format("%Y%m%d")
    )
}

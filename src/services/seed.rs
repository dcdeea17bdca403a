//! Reference data seeding
//!
//! Fills the hospitals, specialties and news tables with the portal's
//! initial content. Each table is seeded only while it is empty, and each
//! table's rows go in as one all-or-nothing batch, so running the seed any
//! number of times leaves the same data as running it once.

use crate::db::Storage;
use crate::models::{
    CreateHospitalInput, CreateNewsInput, CreateSpecialtyInput, Hospital, News, Specialty,
};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};

const HOSPITALS: &[(&str, &str, &str)] = &[
    (
        "Hospital Municipal de São Caetano",
        "Rua das Flores, 123 - Centro",
        "(11) 4229-1234",
    ),
    (
        "Hospital Dr. Manoel de Abreu",
        "Av. Goiás, 1000 - Barcelona",
        "(11) 4229-5678",
    ),
    (
        "UPA 24h São Caetano",
        "Rua Amazonas, 500 - Fundação",
        "(11) 4229-9012",
    ),
];

const SPECIALTIES: &[&str] = &[
    "Cardiologia",
    "Ortopedia",
    "Pediatria",
    "Ginecologia",
    "Dermatologia",
    "Oftalmologia",
    "Neurologia",
    "Clínico Geral",
];

/// (title, summary, content, category), newest first
const NEWS: &[(&str, &str, &str, &str)] = &[
    (
        "Nova Campanha de Vacinação contra a Gripe",
        "A Secretaria de Saúde anuncia o início da campanha de vacinação contra a gripe para idosos e grupos prioritários. Atendimento disponível em todas as unidades.",
        "A partir desta semana, todas as unidades de saúde de São Caetano do Sul estarão realizando a vacinação contra a gripe. A campanha prioriza idosos acima de 60 anos, gestantes, crianças de 6 meses a 5 anos, e pessoas com doenças crônicas.",
        "Vacinação",
    ),
    (
        "Dicas para Prevenir Doenças Cardiovasculares",
        "Especialistas compartilham orientações importantes sobre alimentação saudável, exercícios físicos e check-ups regulares para cuidar do coração.",
        "Manter uma alimentação equilibrada, praticar exercícios regularmente e realizar check-ups periódicos são medidas essenciais para prevenir doenças cardiovasculares. Consulte seu cardiologista regularmente.",
        "Prevenção",
    ),
    (
        "Novos Horários de Atendimento nos Hospitais",
        "A partir desta semana, os hospitais de São Caetano do Sul ampliam horários de atendimento para melhor atender a população.",
        "Os hospitais municipais agora funcionam com horário estendido das 7h às 20h de segunda a sexta-feira, e das 8h às 14h aos sábados. A UPA 24h continua com atendimento ininterrupto.",
        "Atendimento",
    ),
    (
        "Importância do Check-up Regular",
        "Médicos reforçam a necessidade de realizar exames de rotina para detectar doenças precocemente e manter a saúde em dia.",
        "Realizar exames de rotina anualmente pode salvar vidas. Check-ups regulares permitem detectar doenças em estágios iniciais, quando o tratamento é mais eficaz.",
        "Saúde",
    ),
    (
        "Campanha de Conscientização sobre Diabetes",
        "Ações educativas sobre prevenção e controle do diabetes serão realizadas nas unidades de saúde durante todo o mês.",
        "Durante este mês, as unidades de saúde realizarão palestras e orientações sobre diabetes. Aprenda a prevenir e controlar esta doença que afeta milhões de brasileiros.",
        "Prevenção",
    ),
    (
        "Novo Equipamento de Ressonância Magnética",
        "Hospital Municipal recebe novo equipamento de última geração para exames de ressonância magnética, reduzindo tempo de espera.",
        "O Hospital Municipal de São Caetano acaba de receber um equipamento de ressonância magnética de última geração, que permitirá realizar mais exames com maior precisão e menor tempo de espera.",
        "Tecnologia",
    ),
];

/// Which tables a seed run populated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub hospitals: usize,
    pub specialties: usize,
    pub news: usize,
}

impl SeedReport {
    /// True when every table already had data
    pub fn is_noop(&self) -> bool {
        self.hospitals == 0 && self.specialties == 0 && self.news == 0
    }
}

/// Seed every empty reference table.
///
/// # Errors
///
/// Any storage failure aborts the run. Tables seeded before the failure
/// keep their rows and rerunning skips them; the failing table stays empty
/// and is seeded in full by the next run.
pub async fn run(storage: &Storage) -> Result<SeedReport> {
    tracing::info!("Seeding database...");
    let mut report = SeedReport::default();

    if storage.hospitals.count().await.context("Failed to count hospitals")? == 0 {
        let hospitals: Vec<Hospital> = HOSPITALS
            .iter()
            .map(|(name, address, phone)| {
                Hospital::new(CreateHospitalInput {
                    name: name.to_string(),
                    address: address.to_string(),
                    phone: phone.to_string(),
                })
            })
            .collect();
        storage
            .hospitals
            .create_many(&hospitals)
            .await
            .context("Failed to seed hospitals")?;
        report.hospitals = hospitals.len();
        tracing::info!("Seeded {} hospitals", report.hospitals);
    }

    if storage.specialties.count().await.context("Failed to count specialties")? == 0 {
        let specialties: Vec<Specialty> = SPECIALTIES
            .iter()
            .map(|name| {
                Specialty::new(CreateSpecialtyInput {
                    name: name.to_string(),
                    image_url: None,
                })
            })
            .collect();
        storage
            .specialties
            .create_many(&specialties)
            .await
            .context("Failed to seed specialties")?;
        report.specialties = specialties.len();
        tracing::info!("Seeded {} specialties", report.specialties);
    }

    if storage.news.count().await.context("Failed to count news")? == 0 {
        let now = Utc::now();
        let news: Vec<News> = NEWS
            .iter()
            .enumerate()
            .map(|(idx, (title, summary, content, category))| {
                let mut news = News::new(CreateNewsInput {
                    title: title.to_string(),
                    summary: summary.to_string(),
                    content: content.to_string(),
                    category: category.to_string(),
                    image_url: None,
                });
                // Stagger timestamps so the feed keeps this order
                news.created_at = now - Duration::minutes(idx as i64);
                news
            })
            .collect();
        storage
            .news
            .create_many(&news)
            .await
            .context("Failed to seed news")?;
        report.news = news.len();
        tracing::info!("Seeded {} news items", report.news);
    }

    if report.is_noop() {
        tracing::info!("Reference data already present, nothing to seed");
    } else {
        tracing::info!("Database seeded successfully");
    }
    Ok(report)
}

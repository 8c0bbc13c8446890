//! Caixa Draw Source
//!
//! Reads official results from the Caixa lottery portal API:
//! `GET {base}/{megasena|lotofacil}/{contest}`.
//!
//! The portal answers an unknown or future contest with a 404, an empty
//! body, a result without numbers, or the latest published result. All of
//! these mean "not drawn yet".
//!
//! Tier names like "5 acertos" are rewritten to the lottery's canonical
//! label ("Quina") so the matcher sees one spelling per tier.

use crate::domain::draw_source::{DrawSource, DrawSourceError};
use crate::domain::entity::draw::{DrawResult, PrizeTier};
use crate::domain::rules::{LotteryRules, normalize_label};
use crate::domain::value_object::lottery_type::LotteryType;
use chrono::NaiveDate;
use platform::http::{HttpClientConfig, HttpError, JsonClient};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaixaDraw {
    #[serde(default)]
    numero: Option<u32>,
    #[serde(default)]
    data_apuracao: Option<String>,
    #[serde(default)]
    lista_dezenas: Vec<String>,
    #[serde(default)]
    lista_rateio_premio: Vec<CaixaPrizeTier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaixaPrizeTier {
    descricao_faixa: String,
    #[serde(default)]
    numero_de_ganhadores: u32,
    #[serde(default)]
    valor_premio: f64,
}

/// HTTP draw source backed by the Caixa portal
#[derive(Debug, Clone)]
pub struct CaixaDrawSource {
    client: JsonClient,
    base_url: String,
}

impl CaixaDrawSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, HttpError> {
        let client = JsonClient::new(&HttpClientConfig {
            timeout,
            ..Default::default()
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, lottery_type: LotteryType, contest_number: u32) -> String {
        format!("{}/{}/{}", self.base_url, lottery_type.code(), contest_number)
    }
}

impl DrawSource for CaixaDrawSource {
    async fn fetch_draw(
        &self,
        lottery_type: LotteryType,
        contest_number: u32,
    ) -> Result<Option<DrawResult>, DrawSourceError> {
        let url = self.url(lottery_type, contest_number);
        let raw = self
            .client
            .get_json::<CaixaDraw>(&url)
            .await
            .map_err(classify)?;

        let draw = match raw {
            Some(raw) => into_draw(raw, lottery_type, contest_number)?,
            None => None,
        };

        if draw.is_none() {
            tracing::debug!(
                lottery = %lottery_type,
                contest_number,
                "Contest not drawn yet"
            );
        }
        Ok(draw)
    }
}

fn classify(err: HttpError) -> DrawSourceError {
    if err.is_timeout() {
        DrawSourceError::Timeout
    } else if err.is_malformed() {
        DrawSourceError::Malformed(err.to_string())
    } else {
        DrawSourceError::Unavailable(err.to_string())
    }
}

/// Canonical label for a tier reported as "<hits> acertos" or "<hits> pontos"
fn canonical_tier_label(rules: &LotteryRules, reported: &str) -> Option<String> {
    let normalized = normalize_label(reported);
    let mut words = normalized.split(' ');
    let hits = words.next()?.parse::<usize>().ok()?;
    match (words.next(), words.next()) {
        (Some("acertos" | "pontos"), None) => rules
            .tier_for_hits(hits)
            .map(|tier| tier.canonical_label.clone()),
        _ => None,
    }
}

fn into_draw(
    raw: CaixaDraw,
    lottery_type: LotteryType,
    contest_number: u32,
) -> Result<Option<DrawResult>, DrawSourceError> {
    if raw.lista_dezenas.is_empty() || raw.numero != Some(contest_number) {
        return Ok(None);
    }

    let numbers = raw
        .lista_dezenas
        .iter()
        .map(|d| {
            d.trim()
                .parse::<u8>()
                .map_err(|_| DrawSourceError::Malformed(format!("drawn number '{d}'")))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let date = raw
        .data_apuracao
        .as_deref()
        .ok_or_else(|| DrawSourceError::Malformed("missing draw date".to_string()))?;
    let draw_date = NaiveDate::parse_from_str(date.trim(), "%d/%m/%Y")
        .map_err(|_| DrawSourceError::Malformed(format!("draw date '{date}'")))?;

    let rules = LotteryRules::builtin(lottery_type);
    let tiers = raw
        .lista_rateio_premio
        .into_iter()
        .map(|t| PrizeTier {
            label: canonical_tier_label(&rules, &t.descricao_faixa).unwrap_or(t.descricao_faixa),
            winners: t.numero_de_ganhadores,
            prize: t.valor_premio,
        })
        .collect();

    Ok(Some(DrawResult {
        contest_number,
        draw_date,
        numbers,
        tiers,
    }))
}

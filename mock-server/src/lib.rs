use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

/// Address payload in ViaCEP's wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaCepAddress {
    pub cep: String,
    pub logradouro: String,
    pub complemento: String,
    pub bairro: String,
    pub localidade: String,
    pub uf: String,
    pub ibge: String,
    pub ddd: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Known addresses keyed by the eight-digit code.
pub type AddressBook = Arc<HashMap<String, ViaCepAddress>>;

pub fn seed() -> HashMap<String, ViaCepAddress> {
    let entries = [
        ViaCepAddress {
            cep: "01001-000".to_string(),
            logradouro: "Praça da Sé".to_string(),
            complemento: "lado ímpar".to_string(),
            bairro: "Sé".to_string(),
            localidade: "São Paulo".to_string(),
            uf: "SP".to_string(),
            ibge: "3550308".to_string(),
            ddd: "11".to_string(),
        },
        ViaCepAddress {
            cep: "01310-100".to_string(),
            logradouro: "Avenida Paulista".to_string(),
            complemento: "de 612 a 1510 - lado par".to_string(),
            bairro: "Bela Vista".to_string(),
            localidade: "São Paulo".to_string(),
            uf: "SP".to_string(),
            ibge: "3550308".to_string(),
            ddd: "11".to_string(),
        },
        // City-wide code: no street or district.
        ViaCepAddress {
            cep: "78890-000".to_string(),
            logradouro: String::new(),
            complemento: String::new(),
            bairro: String::new(),
            localidade: "Sorriso".to_string(),
            uf: "MT".to_string(),
            ibge: "5107925".to_string(),
            ddd: "66".to_string(),
        },
    ];
    entries
        .into_iter()
        .map(|address| (address.cep.replace('-', ""), address))
        .collect()
}

pub fn app() -> Router {
    app_with(seed())
}

pub fn app_with(addresses: HashMap<String, ViaCepAddress>) -> Router {
    let book: AddressBook = Arc::new(addresses);
    Router::new()
        .route("/ws/{cep}/{format}", get(lookup))
        .route("/ws/{cep}/{format}/", get(lookup))
        .with_state(book)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn lookup(
    State(book): State<AddressBook>,
    Path((cep, format)): Path<(String, String)>,
) -> Response {
    if format != "json" {
        return bad_request(format!("unsupported format: {format}"));
    }
    if cep.len() != 8 || !cep.bytes().all(|b| b.is_ascii_digit()) {
        tracing::debug!(%cep, "malformed postal code");
        return bad_request("invalid postal code format".to_string());
    }

    match book.get(&cep) {
        Some(address) => {
            tracing::debug!(%cep, "postal code found");
            Json(address.clone()).into_response()
        }
        None => {
            tracing::debug!(%cep, "postal code unknown");
            Json(json!({ "erro": "true" })).into_response()
        }
    }
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { message })).into_response()
}

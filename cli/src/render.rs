//! Terminal rendering of the lookup state.

use cep_core::{LookupState, Outcome};

/// Text block for the current outcome. Empty before the first resolution.
pub fn render(state: &LookupState) -> String {
    match state.outcome() {
        Outcome::Empty => String::new(),
        Outcome::Found(address) => format!(
            "Endereço Encontrado\n\
             CEP: {}\n\
             Logradouro: {}\n\
             Bairro: {}\n\
             Cidade: {}\n\
             Estado: {}\n",
            address.postal_code, address.street, address.district, address.city, address.state_code
        ),
        Outcome::Failed(message) => format!("{message}\n"),
    }
}

//! Regex patterns for the Italian student-residence contract template.
//!
//! Every pattern is case-insensitive and targets one field or a tightly
//! related group of fields.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Guest: "Il/La Sig./Sig.ra MARIO ROSSI, nato/a"
    pub static ref GUEST_NAME: Regex = Regex::new(
        r"(?i)(?:E:\s*)?Il/La\s+Sig\./Sig\.ra\s+(\p{L}[\p{L}'\s]+),?\s+nato/a"
    ).unwrap();

    // Birth place and date: "nato/a a ROMA (RM) il 01/02/2003"
    pub static ref BIRTH_INFO: Regex = Regex::new(
        r"(?i)nato/a\s+a\s+([\p{L}'\s]+?)(?:\s*\(\s*[A-Z]{2}\s*\))?\s+il\s+(\d{1,2}/\d{1,2}/\d{4})"
    ).unwrap();

    // Italian fiscal code: "C.F. RSSMRA85T10A562S"
    pub static ref FISCAL_CODE: Regex = Regex::new(
        r"(?i)\bC\.\s?F\.?[\s:]+([A-Z0-9]{16})\b"
    ).unwrap();

    // Residence: "residente in MILANO, VIA GARIBALDI 12"
    pub static ref RESIDENCE: Regex = Regex::new(
        r"(?i)residente\s+in\s+([\p{L}'\s]+),\s+([\p{L}'.\s]+\d+)"
    ).unwrap();

    // Total fee: "retta di euro 12.360,00"
    pub static ref RENT_TOTAL: Regex = Regex::new(
        r"(?i)retta\s+di\s+euro\s+(?:€\s*)?(\d[\d.,]*)"
    ).unwrap();

    // Installment structure: "in numero 3 rate"
    pub static ref INSTALLMENT_COUNT: Regex = Regex::new(
        r"(?i)in\s+numero\s+(\d+)\s+rate"
    ).unwrap();

    // Ordinal installments: "€4944 prima rata entro il 25 settembre 2025"
    pub static ref FIRST_INSTALLMENT: Regex = installment_pattern("prima");
    pub static ref SECOND_INSTALLMENT: Regex = installment_pattern("seconda");
    pub static ref THIRD_INSTALLMENT: Regex = installment_pattern("terza");

    // Security deposit, stated as a loss: "perdita di €250"
    pub static ref SECURITY_DEPOSIT: Regex = Regex::new(
        r"(?i)perdita\s+di\s+€\s*(\d[\d.,]*)"
    ).unwrap();

    // Contract period: "godimento ... dal 10 ottobre 2025, al 30 giugno 2026"
    pub static ref CONTRACT_PERIOD: Regex = Regex::new(
        r"(?i)godimento.*?dal\s+(\d{1,2}\s+\p{L}+\s+\d{4}),?\s+al\s+(\d{1,2}\s+\p{L}+\s+\d{4})"
    ).unwrap();

    // Accommodation, residence building form: "Via Nomentum 12/B"
    pub static ref ACCOMMODATION_NOMENTUM: Regex = Regex::new(
        r"(?i)Via\s+Nomentum\s+([\d/]+)"
    ).unwrap();

    // Accommodation, generic property form: "immobile in Roma, Via Tiburtina 100"
    pub static ref ACCOMMODATION_PROPERTY: Regex = Regex::new(
        r"(?i)immobile\s+in\s+Roma,\s+Via\s+([A-Za-z\s]+\d+[\d/]*)"
    ).unwrap();

    // University and academic year: "Università LUISS ... anno accademico 2025/2026"
    pub static ref UNIVERSITY: Regex = Regex::new(
        r"(?i)Universit[àa]\s+([A-Z]+).*?anno\s+accademico\s+([\d/]+)"
    ).unwrap();
}

fn installment_pattern(ordinal: &str) -> Regex {
    Regex::new(&format!(
        r"(?i)€\s*(\d[\d.,]*)\s+{}\s+rata\s+entro\s+il\s+(\d{{1,2}}\s+\p{{L}}+\s+\d{{4}}|\d{{1,2}}/\d{{1,2}}/\d{{4}})",
        ordinal
    ))
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_name() {
        let caps = GUEST_NAME
            .captures("E: Il/La Sig./Sig.ra MARIO ROSSI, nato/a a ROMA il 10/12/1985")
            .unwrap();
        assert_eq!(caps[1].trim(), "MARIO ROSSI");
    }

    #[test]
    fn test_birth_info_with_province() {
        let caps = BIRTH_INFO
            .captures("nato/a a BARI (BA) il 03/04/2004")
            .unwrap();
        assert_eq!(caps[1].trim(), "BARI");
        assert_eq!(&caps[2], "03/04/2004");
    }

    #[test]
    fn test_fiscal_code_label_variants() {
        for text in ["C.F. RSSMRA85T10A562S", "C.F.: RSSMRA85T10A562S", "c.f. rssmra85t10a562s"] {
            let caps = FISCAL_CODE.captures(text).unwrap();
            assert_eq!(caps[1].to_uppercase(), "RSSMRA85T10A562S");
        }
    }

    #[test]
    fn test_installment_ordinals_are_distinct() {
        let text = "€4944 prima rata entro il 25 settembre 2025";
        assert!(FIRST_INSTALLMENT.is_match(text));
        assert!(!SECOND_INSTALLMENT.is_match(text));
        assert!(!THIRD_INSTALLMENT.is_match(text));
    }

    #[test]
    fn test_contract_period() {
        let caps = CONTRACT_PERIOD
            .captures("il godimento dell'alloggio dal 10 ottobre 2025, al 30 giugno 2026")
            .unwrap();
        assert_eq!(&caps[1], "10 ottobre 2025");
        assert_eq!(&caps[2], "30 giugno 2026");
    }
}

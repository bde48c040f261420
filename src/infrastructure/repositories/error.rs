use crate::domain::errors::DomainError;

const CNT_CLIENT_PKEY: &str = "clients_pkey";
const CNT_CODE_PKEY: &str = "authorization_codes_pkey";
const CNT_TOKEN_PKEY: &str = "tokens_pkey";
const CNT_CODE_CLIENT: &str = "authorization_codes_client_id_fkey";
const CNT_TOKEN_CLIENT: &str = "tokens_client_id_fkey";
const CNT_CODE_CHALLENGE_PAIR: &str = "authorization_codes_challenge_pair_chk";

pub fn map_sqlx(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    CNT_CLIENT_PKEY => DomainError::Conflict("client already registered".into()),
                    CNT_CODE_PKEY => DomainError::Conflict("authorization code already exists".into()),
                    CNT_TOKEN_PKEY => DomainError::Conflict("access token already exists".into()),
                    CNT_CODE_CLIENT | CNT_TOKEN_CLIENT => {
                        DomainError::NotFound("client not found".into())
                    }
                    CNT_CODE_CHALLENGE_PAIR => DomainError::Validation(
                        "code_challenge and code_challenge_method must be stored together".into(),
                    ),
                    other => {
                        DomainError::Persistence(format!("database constraint violation: {other}"))
                    }
                };
            }

            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    "23505" => {
                        return DomainError::Conflict("unique constraint violated".into());
                    }
                    "23503" => {
                        return DomainError::NotFound("referenced record not found".into());
                    }
                    "23514" => {
                        return DomainError::Validation("check constraint violated".into());
                    }
                    _ => {}
                }
            }

            DomainError::Persistence(db_err.message().to_string())
        }
        _ => DomainError::Persistence(err.to_string()),
    }
}

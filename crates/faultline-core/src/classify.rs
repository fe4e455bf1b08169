use crate::carrier::{ErrorCarrier, Problem};
use crate::failure::{ApiError, Failure, GENERIC_MESSAGE, Unclassified};
use crate::translate;

/// Turn any failure into a carrier
///
/// Pure and total: every variant yields a carrier with a 4xx/5xx status and
/// a (possibly empty) problem list. Arms are listed in the order families are
/// recognized.
pub fn classify(failure: Failure) -> ErrorCarrier {
    match failure {
        Failure::Application(err) => application(err),
        Failure::Schema(violation) => translate::schema::translate(&violation),
        Failure::Store(err) => translate::store::translate(&err),
        Failure::Token(err) => translate::token::translate(&err),
        Failure::Upload(err) => translate::upload::translate(&err),
        Failure::Unclassified(err) => fallback(err),
    }
}

fn application(err: ApiError) -> ErrorCarrier {
    ErrorCarrier::new(err.status().as_u16(), err.message())
        .with_problem(Problem::general(err.message()))
        .with_trace(err.trace().map(str::to_owned))
}

fn fallback(err: Unclassified) -> ErrorCarrier {
    let (status, message, problems, trace) = err.into_parts();

    ErrorCarrier::new(status.unwrap_or(500), message.unwrap_or_else(|| GENERIC_MESSAGE.to_owned()))
        .with_problems(problems)
        .with_trace(trace)
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::translate::schema::{SchemaIssue, SchemaViolation};
    use crate::translate::store::{RequestErrorKind, StoreError, StoreMeta};
    use crate::translate::token::TokenError;
    use crate::translate::upload::UploadError;

    fn all_kinds() -> Vec<Failure> {
        vec![
            ApiError::unauthorized("Unauthorized request.").into(),
            ApiError::new(StatusCode::OK, "not really an error").into(),
            SchemaViolation::new(vec![SchemaIssue::new(vec!["a".into()], "bad")]).into(),
            SchemaViolation::new(Vec::new()).into(),
            StoreError::known(RequestErrorKind::UniqueViolation, "dup").into(),
            StoreError::Unavailable("down".to_owned()).into(),
            StoreError::Unknown("?".to_owned()).into(),
            TokenError::Expired.into(),
            TokenError::Invalid("sig".to_owned()).into(),
            UploadError::file_too_large("image", 1).into(),
            Unclassified::new().into(),
            Unclassified::new().with_status(302).into(),
            Unclassified::new().with_status(1000).into(),
        ]
    }

    #[test]
    fn every_failure_yields_an_error_status() {
        for failure in all_kinds() {
            let carrier = classify(failure);
            let status = carrier.status();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "unexpected status {status}"
            );
        }
    }

    #[test]
    fn application_error_passes_through_with_single_problem() {
        let carrier = classify(ApiError::forbidden("Unauthorized User").into());
        assert_eq!(carrier.status(), StatusCode::FORBIDDEN);
        assert_eq!(carrier.message(), "Unauthorized User");
        assert_eq!(carrier.problems(), [Problem::general("Unauthorized User")]);
    }

    #[test]
    fn fallback_defaults() {
        let carrier = classify(Unclassified::new().into());
        assert_eq!(carrier.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(carrier.message(), GENERIC_MESSAGE);
        assert!(carrier.problems().is_empty());
    }

    #[test]
    fn fallback_keeps_own_status_message_and_problems() {
        let failure = Unclassified::new()
            .with_status(404)
            .with_message("Route not found.")
            .with_problems(vec![Problem::new("/nope", "Route not found.")]);

        let carrier = classify(failure.into());
        assert_eq!(carrier.status(), StatusCode::NOT_FOUND);
        assert_eq!(carrier.message(), "Route not found.");
        assert_eq!(carrier.problems(), [Problem::new("/nope", "Route not found.")]);
    }

    #[test]
    fn fallback_rejects_out_of_range_status() {
        let carrier = classify(Unclassified::new().with_status(204).with_message("odd").into());
        assert_eq!(carrier.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(carrier.message(), "odd");
    }

    #[test]
    fn store_failure_routes_to_store_translator() {
        let failure: Failure = StoreError::known(RequestErrorKind::UniqueViolation, "dup")
            .with_meta(StoreMeta {
                target: vec!["email".to_owned()],
                cause: None,
            })
            .into();

        let carrier = classify(failure);
        assert_eq!(carrier.status(), StatusCode::CONFLICT);
        assert_eq!(carrier.problems(), [Problem::new("email", "Already exists")]);
    }

    #[test]
    fn from_error_keeps_display_text() {
        let io = std::io::Error::other("disk on fire");
        let carrier = classify(Unclassified::from_error(&io).into());
        assert_eq!(carrier.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(carrier.message(), "disk on fire");
    }
}

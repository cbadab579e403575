use warp::{reject::Rejection, Filter};

use crate::database::error::Error;

use super::jwt::{verify_jwt_session, SessionData};

pub fn with_auth() -> impl Filter<Extract = ((),), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        if verify_jwt_session(session).is_ok() {
            Ok(())
        } else {
            Err(Error::Unauthenticated.into_rejection())
        }
    })
}

pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        match verify_jwt_session(session) {
            Ok(data) => Ok(SessionData::from(data)),
            Err(_) => Err(Error::Unauthenticated.into_rejection()),
        }
    })
}

/// Extracts a session when one is present and valid; anonymous requests pass
/// through with `None` so read-side predicates can degrade to empty results.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = std::convert::Infallible> + Copy {
    warp::cookie::optional::<String>("session").map(|session: Option<String>| {
        session
            .and_then(|token| verify_jwt_session(token).ok())
            .map(SessionData::from)
    })
}

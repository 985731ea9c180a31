use actix_web::HttpResponse;

use crate::session_state::TypedSession;
use crate::utils::see_other;

pub async fn log_out(session: TypedSession) -> HttpResponse {
    session.log_out();
    see_other("/index")
}

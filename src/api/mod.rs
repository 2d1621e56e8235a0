use rocket::Route;

mod admin;
mod elections;
mod voter;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(elections::routes());
    routes.extend(voter::routes());
    routes.extend(voting::routes());
    routes
}

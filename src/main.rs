use rocket::{Build, Rocket};

#[rocket::launch]
fn rocket() -> Rocket<Build> {
    let server = bookstore_api::rocket();
    log::info!("Starting Bookstore API Server");
    server
}

#[rocket::launch]
fn rocket() -> _ {
    ticket_api::rocket()
}

//! API client module for the CarParter backend

pub mod car_center;
pub mod chat;
pub mod chatbot;
pub mod client;
pub mod completed_repair;
pub mod error;
pub mod notification;
pub mod user;

use anyhow::{Context, Result};

pub use chat::ChatSource;
pub use client::ApiClient;
pub use error::ApiError;

use crate::config::Config;
use crate::models::{
    CarCenter, CarCenterRegistration, CarCenterUpdate, CenterSearch, CreateChatRoomRequest,
    CsInquiryForm, DuplicateField, EstimateForm, QuoteRequestForm, ReservationForm, ReviewForm,
    ReviewReplyForm, ReviewReportForm, UsedPart,
};

/// Backend client from the stored config, with an optional base URL override.
pub fn connect(base_url: Option<&str>) -> Result<ApiClient> {
    let config = Config::load()?;
    let client = match base_url {
        Some(base) => ApiClient::new(base, config.bearer_token()),
        None => ApiClient::from_config(&config),
    };
    client.context("Failed to create API client")
}

/// List my chat rooms (prints to stdout).
pub async fn list_rooms(client: &ApiClient) -> Result<()> {
    let rooms = chat::list_rooms(client).await?;

    println!("\nChat Rooms:");
    println!("{:-<60}", "");

    if rooms.is_empty() {
        println!("  (no chat rooms)");
        return Ok(());
    }

    for room in &rooms {
        println!("{} <-> {}", room.user.name, room.car_center.name);
        println!("  ID: {}", room.room_id);
        println!("  Updated: {}", room.updated_at);
        if let Some(ref last) = room.last_message {
            if !last.trim().is_empty() {
                println!("  Last: {}", last.trim());
            }
        }
        println!();
    }

    Ok(())
}

/// Open (or reuse) the room for a center and estimate.
pub async fn open_room(client: &ApiClient, center_id: &str, estimate_id: i64) -> Result<()> {
    let room = chat::create_or_get_room(
        client,
        &CreateChatRoomRequest {
            center_id: center_id.to_string(),
            estimate_id,
        },
    )
    .await?;
    println!("Room {} with {}", room.room_id, room.car_center.name);
    Ok(())
}

/// Print the message history of a room.
pub async fn show_history(client: &ApiClient, room_id: &str) -> Result<()> {
    let messages = chat::history(client, room_id).await?;

    if messages.is_empty() {
        println!("(no messages)");
        return Ok(());
    }

    for msg in &messages {
        println!("[{}] {}: {}", msg.created_at, msg.sender_name, msg.content);
    }

    Ok(())
}

/// List completed repairs, mine or (with `center`) the logged-in center's.
pub async fn list_repairs(client: &ApiClient, center: bool) -> Result<()> {
    let repairs = if center {
        completed_repair::center_completed_repairs(client).await?
    } else {
        completed_repair::my_completed_repairs(client).await?
    };

    println!("\nRepairs:");
    println!("{:-<60}", "");

    if repairs.is_empty() {
        println!("  (no repairs)");
        return Ok(());
    }

    for repair in &repairs {
        println!(
            "#{:<6} {:<10} {} / {}",
            repair.id,
            repair.status.label(),
            repair.car_center_name,
            repair.user_name
        );
        println!("  {} ({}원)", repair.repair_details, repair.final_cost);
        if repair.is_reviewable() {
            println!("  review pending");
        }
    }

    Ok(())
}

pub async fn show_repair(client: &ApiClient, repair_id: i64) -> Result<()> {
    let repair = completed_repair::details(client, repair_id).await?;

    println!();
    println!("Repair:   #{} ({})", repair.id, repair.status.label());
    println!("Center:   {}", repair.car_center_name);
    println!("Customer: {}", repair.user_name);
    if let Some(ref model) = repair.car_model {
        println!(
            "Vehicle:  {} {}",
            model,
            repair.license_plate.as_deref().unwrap_or("")
        );
    }
    println!("Details:  {}", repair.repair_details);
    println!("Cost:     {}원", repair.final_cost);
    println!("Created:  {}", repair.created_at);
    println!(
        "Done:     {}",
        repair.completed_at.as_deref().unwrap_or("(not yet)")
    );

    Ok(())
}

pub async fn complete_repair(client: &ApiClient, repair_id: i64) -> Result<()> {
    completed_repair::mark_completed(client, repair_id).await?;
    println!("Repair #{} marked as completed.", repair_id);
    Ok(())
}

pub async fn delete_repair(client: &ApiClient, repair_id: i64) -> Result<()> {
    completed_repair::delete(client, repair_id).await?;
    println!("Repair #{} deleted.", repair_id);
    Ok(())
}

/// List my registered vehicles.
pub async fn list_vehicles(client: &ApiClient) -> Result<()> {
    let cars = user::my_vehicles(client).await?;

    if cars.is_empty() {
        println!("등록된 차량이 없습니다.");
        return Ok(());
    }

    for car in &cars {
        println!(
            "{:<6} {:<14} {} ({})",
            car.user_car_id, car.car_number, car.car_model, car.model_year
        );
    }

    Ok(())
}

/// Search car centers.
pub async fn search_centers(client: &ApiClient, filters: &CenterSearch) -> Result<()> {
    let centers = car_center::search(client, filters).await?;

    println!("\nCar Centers:");
    println!("{:-<60}", "");

    if centers.is_empty() {
        println!("  (no car centers found)");
        return Ok(());
    }

    for center in &centers {
        println!("{} ({})", center.center_name, center.center_id);
        println!("  {}  {}", center.address, center.phone_number);
        if let Some((lat, lng)) = center.coordinates() {
            println!("  at {:.5}, {:.5}", lat, lng);
        }
    }

    Ok(())
}

/// Ask the help chatbot.
pub async fn ask_chatbot(message: &str) -> Result<()> {
    let config = Config::load()?;
    let client = ApiClient::chatbot(&config)?;
    let reply = chatbot::ask(&client, message).await?;
    println!("{}", reply);
    Ok(())
}

pub async fn list_notifications(client: &ApiClient) -> Result<()> {
    let items = notification::list(client).await?;
    let unread = notification::unread_count(client).await?;

    println!("\nNotifications ({} unread):", unread);
    println!("{:-<60}", "");

    if items.is_empty() {
        println!("  (no notifications)");
        return Ok(());
    }

    for item in &items {
        let marker = if item.is_read { " " } else { "*" };
        println!("{} [{}] {}", marker, item.create_time, item.message);
    }

    Ok(())
}

pub async fn show_profile(client: &ApiClient) -> Result<()> {
    let me = user::profile(client).await?;
    println!("User:  {} ({})", me.name, me.user_id);
    println!("Phone: {}", me.phone_number);
    Ok(())
}

/// Show my open quote request and the estimates it has collected.
pub async fn show_quote_request(client: &ApiClient) -> Result<()> {
    let Some(request) = user::my_quote_request(client).await? else {
        println!("진행 중인 견적 요청이 없습니다.");
        return Ok(());
    };

    println!();
    println!("Request: #{} ({})", request.request_id, request.created_at);
    println!(
        "Vehicle: {} ({})",
        request.car.car_model, request.car.model_year
    );
    println!("Address: {}", request.address);
    println!("Details: {}", request.request_details);
    println!("\nEstimates ({}):", request.estimate_count);
    println!("{:-<60}", "");

    for estimate in &request.estimates {
        println!(
            "#{:<6} {:<10} {}원  {}",
            estimate.estimate_id,
            format!("{:?}", estimate.status),
            estimate.estimated_cost,
            estimate.center_name.as_deref().unwrap_or("-")
        );
        if !estimate.details.trim().is_empty() {
            println!("  {}", estimate.details.trim());
        }
    }

    Ok(())
}

pub async fn accept_estimate(client: &ApiClient, estimate_id: i64) -> Result<()> {
    user::accept_estimate(client, estimate_id).await?;
    println!("Estimate #{} accepted.", estimate_id);
    Ok(())
}

/// Quote requests open to the logged-in center, and its sent estimates.
pub async fn list_estimates(client: &ApiClient) -> Result<()> {
    let requests = car_center::quote_requests(client).await?;
    let estimates = car_center::my_estimates(client).await?;

    println!("\nQuote Requests:");
    println!("{:-<60}", "");
    if requests.is_empty() {
        println!("  (no quote requests)");
    }
    for request in &requests {
        println!(
            "#{:<6} {} {} ({})",
            request.request_id, request.customer_name, request.car_model, request.car_year
        );
        println!("  {}", request.request_details);
    }

    println!("\nSent Estimates:");
    println!("{:-<60}", "");
    if estimates.is_empty() {
        println!("  (no estimates)");
    }
    for estimate in &estimates {
        println!(
            "#{:<6} request #{} {}원 {:?}",
            estimate.estimate_id, estimate.request_id, estimate.estimated_cost, estimate.status
        );
    }

    Ok(())
}

pub async fn list_reservations(client: &ApiClient) -> Result<()> {
    let reservations = car_center::my_reservations(client).await?;
    let today = car_center::today_reservation_count(client).await?;

    println!("\nReservations ({} today):", today);
    println!("{:-<60}", "");

    if reservations.is_empty() {
        println!("  (no reservations)");
        return Ok(());
    }

    for r in &reservations {
        println!(
            "#{:<6} {} {} {}",
            r.reservation_id, r.reservation_date, r.customer_name, r.customer_phone
        );
        println!("  {}", r.car_info);
    }

    Ok(())
}

/// Reviews of one center, those the logged-in center received, or my own.
pub async fn list_reviews(client: &ApiClient, center_id: Option<&str>, received: bool) -> Result<()> {
    let reviews = match center_id {
        Some(id) => car_center::reviews_for(client, id).await?,
        None if received => car_center::my_reviews(client).await?,
        None => user::my_reviews(client).await?,
    };

    if reviews.is_empty() {
        println!("(no reviews)");
        return Ok(());
    }

    for review in &reviews {
        println!(
            "#{:<6} {} {} - {}",
            review.review_id,
            "★".repeat(review.rating.min(5) as usize),
            review.center_name,
            review.writer_name
        );
        println!("  {}", review.content);
        if let Some(ref reply) = review.reply {
            println!("  ↳ {}", reply);
        }
    }

    Ok(())
}

pub async fn mark_notification_read(client: &ApiClient, notification_id: i64) -> Result<()> {
    notification::mark_read(client, notification_id).await?;
    println!("Notification #{} marked as read.", notification_id);
    Ok(())
}

fn print_center(center: &CarCenter) {
    println!();
    println!("Center:  {} ({})", center.center_name, center.center_id);
    println!("Status:  {:?}", center.status);
    println!("Address: {}", center.address);
    println!("Phone:   {}", center.phone_number);
    if let Some(ref hours) = center.opening_hours {
        println!("Hours:   {}", hours);
    }
    if let Some((lat, lng)) = center.coordinates() {
        println!("At:      {:.5}, {:.5}", lat, lng);
    }
    if let Some(ref description) = center.description {
        println!("\n{}", description);
    }
}

pub async fn register_center(client: &ApiClient, form: &CarCenterRegistration) -> Result<()> {
    let center = car_center::register(client, form).await?;
    println!("Registered {} ({}). Waiting for approval.", center.center_name, center.center_id);
    Ok(())
}

/// The logged-in center, or any center by id.
pub async fn show_center(client: &ApiClient, center_id: Option<&str>) -> Result<()> {
    let center = match center_id {
        Some(id) => car_center::center(client, id).await?,
        None => car_center::my_info(client).await?,
    };
    print_center(&center);
    Ok(())
}

pub async fn update_center(client: &ApiClient, update: &CarCenterUpdate) -> Result<()> {
    let center = car_center::update_my_info(client, update).await?;
    print_center(&center);
    Ok(())
}

pub async fn check_duplicate(client: &ApiClient, field: DuplicateField, value: &str) -> Result<()> {
    let check = car_center::check_duplicate(client, field, value).await?;
    let verdict = if check.is_duplicate { "taken" } else { "available" };
    println!("{} ({})", check.message, verdict);
    Ok(())
}

pub async fn delete_center(client: &ApiClient, center_id: &str) -> Result<()> {
    car_center::delete_center(client, center_id).await?;
    println!("Center {} deleted.", center_id);
    Ok(())
}

/// Create a reservation, or replace one when `reservation_id` is given.
pub async fn save_reservation(
    client: &ApiClient,
    reservation_id: Option<i64>,
    form: &ReservationForm,
) -> Result<()> {
    let saved = match reservation_id {
        Some(id) => car_center::update_reservation(client, id, form).await?,
        None => car_center::create_reservation(client, form).await?,
    };
    println!(
        "Reservation #{} on {} for {}.",
        saved.reservation_id, saved.reservation_date, saved.customer_name
    );
    Ok(())
}

pub async fn delete_reservation(client: &ApiClient, reservation_id: i64) -> Result<()> {
    car_center::delete_reservation(client, reservation_id).await?;
    println!("Reservation #{} deleted.", reservation_id);
    Ok(())
}

/// Reply to a review, or edit an earlier reply when `reply_id` is given.
pub async fn save_reply(
    client: &ApiClient,
    reply_id: Option<i64>,
    form: &ReviewReplyForm,
) -> Result<()> {
    let reply = match reply_id {
        Some(id) => car_center::update_reply(client, id, form).await?,
        None => car_center::create_reply(client, form).await?,
    };
    println!(
        "Reply #{} on review #{}: {}",
        reply.reply_id, reply.review_id, reply.content
    );
    Ok(())
}

pub async fn delete_reply(client: &ApiClient, reply_id: i64) -> Result<()> {
    car_center::delete_reply(client, reply_id).await?;
    println!("Reply #{} deleted.", reply_id);
    Ok(())
}

pub async fn report_review(client: &ApiClient, form: &ReviewReportForm) -> Result<()> {
    let report = car_center::report_review(client, form).await?;
    println!(
        "Report #{} on review #{} filed ({:?}).",
        report.report_id, report.review_id, report.status
    );
    Ok(())
}

fn print_parts(parts: &[UsedPart]) {
    println!("\nUsed Parts:");
    println!("{:-<60}", "");

    if parts.is_empty() {
        println!("  (no parts)");
        return;
    }

    for part in parts {
        println!(
            "#{:<6} {} [{}] {}원",
            part.part_id, part.part_name, part.category, part.price
        );
        println!("  for {}", part.compatible_car_model);
    }
}

/// The logged-in center's used parts, or a search across all centers.
pub async fn list_parts(client: &ApiClient, query: Option<&str>) -> Result<()> {
    let parts = match query {
        Some(q) => car_center::search_parts(client, q).await?,
        None => car_center::my_used_parts(client).await?,
    };
    print_parts(&parts);
    Ok(())
}

pub async fn show_part(client: &ApiClient, part_id: i64) -> Result<()> {
    let part = car_center::used_part(client, part_id).await?;

    println!();
    println!("Part:     #{} {}", part.part_id, part.part_name);
    println!("Category: {}", part.category);
    println!("Price:    {}원", part.price);
    println!("Fits:     {}", part.compatible_car_model);
    println!("Center:   {}", part.center_id);
    if let Some(ref phone) = part.center_phone_number {
        println!("Phone:    {}", phone);
    }
    for url in &part.image_urls {
        println!("Image:    {}", url);
    }
    if !part.description.trim().is_empty() {
        println!("\n{}", part.description.trim());
    }

    Ok(())
}

pub async fn delete_part(client: &ApiClient, part_id: i64) -> Result<()> {
    car_center::delete_used_part(client, part_id).await?;
    println!("Part #{} deleted.", part_id);
    Ok(())
}

/// Submit an estimate, or replace one when `estimate_id` is given.
pub async fn save_estimate(
    client: &ApiClient,
    estimate_id: Option<i64>,
    form: &EstimateForm,
) -> Result<()> {
    let estimate = match estimate_id {
        Some(id) => car_center::update_estimate(client, id, form).await?,
        None => car_center::submit_estimate(client, form).await?,
    };
    println!(
        "Estimate #{} for request #{}: {}원",
        estimate.estimate_id, estimate.request_id, estimate.estimated_cost
    );
    Ok(())
}

pub async fn show_estimate(client: &ApiClient, estimate_id: i64) -> Result<()> {
    let estimate = car_center::estimate(client, estimate_id).await?;

    println!();
    println!("Estimate: #{} ({:?})", estimate.estimate_id, estimate.status);
    println!("Request:  #{}", estimate.request_id);
    println!(
        "Customer: {} / {} ({})",
        estimate.customer_name, estimate.car_model, estimate.car_year
    );
    println!("Cost:     {}원", estimate.estimated_cost);
    if !estimate.details.trim().is_empty() {
        println!("Details:  {}", estimate.details.trim());
    }

    if !estimate.estimate_items.is_empty() {
        println!("\nItems:");
        println!("{:-<60}", "");
        for item in &estimate.estimate_items {
            println!(
                "{:<20} {:>10}원 {:>5}h  {}",
                item.item_name, item.price, item.required_hours, item.part_type
            );
        }
        println!("{:-<60}", "");
        println!("{:<20} {:>10}원", "합계", estimate.items_total());
    }

    Ok(())
}

pub async fn delete_estimate(client: &ApiClient, estimate_id: i64) -> Result<()> {
    car_center::delete_estimate(client, estimate_id).await?;
    println!("Estimate #{} deleted.", estimate_id);
    Ok(())
}

pub async fn create_quote_request(client: &ApiClient, form: &QuoteRequestForm) -> Result<()> {
    user::create_quote_request(client, form).await?;
    println!("견적 요청이 등록되었습니다.");
    Ok(())
}

pub async fn delete_quote_request(client: &ApiClient, request_id: i64) -> Result<()> {
    user::delete_quote_request(client, request_id).await?;
    println!("Quote request #{} deleted.", request_id);
    Ok(())
}

pub async fn show_review(client: &ApiClient, review_id: i64) -> Result<()> {
    let review = user::review(client, review_id).await?;

    println!();
    println!("Review: #{} ({})", review.review_id, review.created_at);
    println!("Center: {}", review.center_name);
    println!("Rating: {}", "★".repeat(review.rating.min(5) as usize));
    println!("\n{}", review.content);
    if let Some(ref reply) = review.reply {
        println!("  ↳ {}", reply);
    }

    Ok(())
}

/// Write a review, or replace one when `review_id` is given.
pub async fn save_review(client: &ApiClient, review_id: Option<i64>, form: &ReviewForm) -> Result<()> {
    match review_id {
        Some(id) => {
            user::update_review(client, id, form).await?;
            println!("Review #{} updated.", id);
        }
        None => {
            user::create_review(client, form).await?;
            println!("리뷰가 등록되었습니다.");
        }
    }
    Ok(())
}

pub async fn delete_review(client: &ApiClient, review_id: i64) -> Result<()> {
    user::delete_review(client, review_id).await?;
    println!("Review #{} deleted.", review_id);
    Ok(())
}

/// List my customer-service inquiries with their answers.
pub async fn list_cs_inquiries(client: &ApiClient) -> Result<()> {
    let inquiries = user::my_cs_inquiries(client).await?;

    println!("\nInquiries:");
    println!("{:-<60}", "");

    if inquiries.is_empty() {
        println!("  (no inquiries)");
        return Ok(());
    }

    for inquiry in &inquiries {
        let state = if inquiry.is_answered() { "답변 완료" } else { "대기 중" };
        println!("#{:<6} [{}] {}", inquiry.inquiry_id, state, inquiry.title);
        println!("  Q: {}", inquiry.question_content);
        if let Some(ref answer) = inquiry.answer_content {
            println!("  A: {}", answer);
        }
    }

    Ok(())
}

pub async fn ask_cs(client: &ApiClient, form: &CsInquiryForm) -> Result<()> {
    user::create_cs_inquiry(client, form).await?;
    println!("문의가 등록되었습니다.");
    Ok(())
}

use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::ContentType,
    post,
    web::{self, Path},
};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{ConsumptionAddRequest, ConsumptionElement, ConsumptionListQuery, DriverQuery, FuelTypeStatElement, TotalSpentByMonthElement},
        state::AppState,
    },
    model::{
        apperror::ApplicationError,
        models::{ConsumptionListInputType, FuelConsumption},
    },
};

/**
 * Registers every fuel consumption endpoint.
 *
 * The aggregate routes are registered before the id route so they are never taken for an id.
 */
pub fn configure_services(config: &mut web::ServiceConfig) {
    config
        .service(add_consumption)
        .service(import_consumptions)
        .service(total_spent_by_month)
        .service(stats_by_fuel_type)
        .service(list_consumptions)
        .service(get_consumption);
}

/**
 * Endpoint to register a single fuel consumption.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "addConsumption", trace_id = get_trace_id(&http_request), result))]
#[post("/consumptions")]
pub async fn add_consumption(http_request: HttpRequest, request_body: web::Json<ConsumptionAddRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let fuel_consumption = FuelConsumption::from(request_body.into_inner());
    let saved = app_state.consumption_service.add_consumption(fuel_consumption).instrument(span).await?;
    Ok(HttpResponse::Ok().json(ConsumptionElement::from(saved)))
}

/**
 * Endpoint to register fuel consumptions from a semicolon separated document.
 *
 * Rejected documents are answered with status 200 and the rejection message as body.
 */
#[instrument(level = "info", skip(http_request, request_body, app_state), fields(service = "importConsumptions", trace_id = get_trace_id(&http_request), result))]
#[post("/consumptions/file")]
pub async fn import_consumptions(http_request: HttpRequest, request_body: String, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let message = app_state.consumption_service.import_consumptions(&request_body).instrument(span).await?;
    Ok(HttpResponse::Ok().content_type(ContentType::plaintext()).body(message))
}

/**
 * Endpoint to list fuel consumptions, optionally for a month and driver.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "listConsumptions", trace_id = get_trace_id(&http_request), result))]
#[get("/consumptions")]
pub async fn list_consumptions(http_request: HttpRequest, query: web::Query<ConsumptionListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let filter_params = ConsumptionListInputType::from(query.into_inner()).validate()?;
    let fuel_consumptions = app_state.consumption_service.get_consumptions(filter_params).instrument(span).await?;
    Ok(HttpResponse::Ok().json(fuel_consumptions.into_iter().map(ConsumptionElement::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to retrieve a single fuel consumption.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "getConsumption", trace_id = get_trace_id(&http_request), result))]
#[get("/consumptions/{consumptionId:\\d+}")]
pub async fn get_consumption(path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let consumption_id = path.into_inner();
    let fuel_consumption = app_state.consumption_service.get_consumption(consumption_id).instrument(span).await?;
    Ok(HttpResponse::Ok().json(ConsumptionElement::from(fuel_consumption)))
}

/**
 * Endpoint to retrieve the money spent per month.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "totalSpentMoneyByMonth", trace_id = get_trace_id(&http_request), result))]
#[get("/consumptions/totalSpentMoneyByMonth")]
pub async fn total_spent_by_month(http_request: HttpRequest, query: web::Query<DriverQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let totals = app_state.consumption_service.get_total_spent_by_month(query.driver.as_deref()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(totals.into_iter().map(TotalSpentByMonthElement::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to retrieve statistics per month and fuel type.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "statsByFuelType", trace_id = get_trace_id(&http_request), result))]
#[get("/consumptions/statsByFuelType")]
pub async fn stats_by_fuel_type(http_request: HttpRequest, query: web::Query<DriverQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let stats = app_state.consumption_service.get_stats_by_fuel_type(query.driver.as_deref()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(stats.into_iter().map(FuelTypeStatElement::from).collect::<Vec<_>>()))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID")
        .and_then(|v| v.to_str().ok().map(std::string::ToString::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use actix_web::{App, http::StatusCode, test, test::TestRequest};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        dao::{memory::InMemoryStore, store::ConsumptionStore},
        service::consumption::FuelConsumptionService,
    };

    const FOUR_ROWS: &str = "FuelType;PricePerLitter;Volume;Date;DriverID\n\
                             Diesel;1.5;100;2019-04-01T11:00:00;driver001\n\
                             98;2;50;2019-04-01T13:30:00;driver002\n\
                             98;2;50;2019-05-01T13:30:00;driver001\n\
                             98;2;50;2019-05-02T14:30:00;driver002\n";

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(&value.to_string()).unwrap()
    }

    fn app_state() -> web::Data<AppState> {
        web::Data::new(AppState::new(FuelConsumptionService::new(ConsumptionStore::InMemory(InMemoryStore::new()))))
    }

    #[actix_web::test]
    async fn test_get_trace_id_exists() {
        let request = TestRequest::default()
            .insert_header(("X-Trace-ID", "test"))
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert_eq!(trace_id, "test");
    }


    #[actix_web::test]
    async fn test_get_trace_id_not_exists() {
        let request = TestRequest::default()
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert!(!trace_id.is_empty());
    }

    #[actix_web::test]
    async fn test_add_consumption() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let request = TestRequest::post()
            .uri("/consumptions")
            .set_json(json!({"fuelType": "Diesel", "pricePerLitter": 1, "volume": 10, "date": "2019-04-01T11:00:00", "driverID": "driver001"}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["id"], json!(1));
        assert_eq!(body["fuelType"], json!("Diesel"));
        assert_eq!(body["driverID"], json!("driver001"));
        assert_eq!(body["totalPrice"], json!(10));
        assert_eq!(body["month"], json!(4));
    }

    #[actix_web::test]
    async fn test_add_invalid_consumption() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let request = TestRequest::post()
            .uri("/consumptions")
            .set_json(json!({"fuelType": "Diesel", "pricePerLitter": 0, "volume": 10, "date": "2019-04-01T11:00:00", "driverID": "driver001"}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body, json!({"code": 1005, "message": "PricePerLitter must be positive"}));
    }

    #[actix_web::test]
    async fn test_import_then_list_all() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let request = TestRequest::post().uri("/consumptions/file").set_payload(FOUR_ROWS).to_request();
        let body = test::call_and_read_body(&app, request).await;
        assert_eq!(body, "Successful");
        let request = TestRequest::get().uri("/consumptions").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.as_array().map(Vec::len), Some(4));
        assert_eq!(body[0]["fuelType"], json!("Diesel"));
        assert_eq!(body[3]["id"], json!(4));
    }

    #[actix_web::test]
    async fn test_import_rejected_document() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let document = "FuelType;PricePerLitter;Volume;Date;DriverID\nDiesel;1.5;100;2019-04-01T11:00:00;driver001\n98;2;50;2019-04-01T13:30:00\n";
        let request = TestRequest::post().uri("/consumptions/file").set_payload(document).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(test::read_body(response).await, "Value column size must be equal to Attribute column size");
        let request = TestRequest::get().uri("/consumptions").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!([]));
    }

    #[actix_web::test]
    async fn test_import_malformed_number() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let document = "FuelType;PricePerLitter;Volume;Date;DriverID\nDiesel;one;100;2019-04-01T11:00:00;driver001\n";
        let request = TestRequest::post().uri("/consumptions/file").set_payload(document).to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_total_spent_money_by_month() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        test::call_service(&app, TestRequest::post().uri("/consumptions/file").set_payload(FOUR_ROWS).to_request()).await;
        let request = TestRequest::get().uri("/consumptions/totalSpentMoneyByMonth").to_request();
        let body = test::call_and_read_body(&app, request).await;
        assert_eq!(body, r#"[{"month":4,"totalMoneySpent":250.00},{"month":5,"totalMoneySpent":200.00}]"#);
        let request = TestRequest::get().uri("/consumptions/totalSpentMoneyByMonth?driver=driver001").to_request();
        let body = test::call_and_read_body(&app, request).await;
        assert_eq!(body, r#"[{"month":4,"totalMoneySpent":150.00},{"month":5,"totalMoneySpent":100.00}]"#);
    }

    #[actix_web::test]
    async fn test_consumptions_for_month() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        test::call_service(&app, TestRequest::post().uri("/consumptions/file").set_payload(FOUR_ROWS).to_request()).await;
        let request = TestRequest::get().uri("/consumptions?month=4").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        let ids: Vec<i64> = body.as_array().unwrap().iter().map(|element| element["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2]);
        let request = TestRequest::get().uri("/consumptions?month=5&driver=driver002").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            body,
            json!([{
                "id": 4,
                "fuelType": "98",
                "pricePerLitter": 2,
                "volume": 50,
                "date": "2019-05-02T14:30:00",
                "driverID": "driver002",
                "totalPrice": 100,
                "month": 5
            }])
        );
    }

    #[actix_web::test]
    async fn test_consumptions_for_invalid_month() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let response = test::call_service(&app, TestRequest::get().uri("/consumptions?month=13").to_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_stats_by_fuel_type() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let document = "FuelType;PricePerLitter;Volume;Date;DriverID\n\
                        Diesel;1.5;100;2019-04-01T11:00:00;driver001\n\
                        98;2;50;2019-04-01T13:30:00;driver002\n\
                        Diesel;2.5;80;2019-04-03T11:00:00;driver002\n";
        test::call_service(&app, TestRequest::post().uri("/consumptions/file").set_payload(document).to_request()).await;
        let request = TestRequest::get().uri("/consumptions/statsByFuelType").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        let stats = body.as_array().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0]["fuelType"], json!("Diesel"));
        assert_eq!(stats[0]["month"], json!(4));
        assert_eq!(decimal(&stats[0]["totalVolume"]), Decimal::from(180));
        assert_eq!(decimal(&stats[0]["averagePricePerLitter"]), Decimal::from(2));
        assert_eq!(decimal(&stats[0]["totalPrice"]), Decimal::from(350));
        assert_eq!(stats[1]["fuelType"], json!("98"));
        assert_eq!(decimal(&stats[1]["totalPrice"]), Decimal::from(100));
        let request = TestRequest::get().uri("/consumptions/statsByFuelType?driver=driver001").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(decimal(&body[0]["averagePricePerLitter"]), Decimal::from_str("1.5").unwrap());
        assert_eq!(decimal(&body[0]["totalVolume"]), Decimal::from(100));
    }

    #[actix_web::test]
    async fn test_total_price_out_of_range_is_rejected() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        let request = TestRequest::post()
            .uri("/consumptions")
            .set_payload(r#"{"fuelType":"Diesel","pricePerLitter":1000000000000000,"volume":1000000000000000,"date":"2019-04-01T11:00:00","driverID":"driver001"}"#)
            .insert_header(("Content-Type", "application/json"))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["message"], json!("TotalPrice is out of range"));
    }

    #[actix_web::test]
    async fn test_get_consumption_by_id() {
        let app = test::init_service(App::new().app_data(app_state()).configure(configure_services)).await;
        test::call_service(&app, TestRequest::post().uri("/consumptions/file").set_payload(FOUR_ROWS).to_request()).await;
        let request = TestRequest::get().uri("/consumptions/2").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["driverID"], json!("driver002"));
        let response = test::call_service(&app, TestRequest::get().uri("/consumptions/99").to_request()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

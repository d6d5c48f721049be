use crate::service::consumption::FuelConsumptionService;

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The fuel consumption service for handling registration and reporting.
     */
    pub consumption_service: FuelConsumptionService,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `consumption_service`: The fuel consumption service for handling registration and reporting.
 */
impl AppState {
    pub fn new(consumption_service: FuelConsumptionService) -> Self {
        AppState { consumption_service }
    }
}

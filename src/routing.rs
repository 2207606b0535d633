//! Application router configuration.

use axum::{Router, routing::get};

use crate::{
    AppState, endpoints,
    home_page::get_home_page,
    not_found::get_404_not_found,
    stores::TransactionStore,
    transaction::{
        create_transaction_endpoint, list_transactions_endpoint, transactions_method_not_allowed,
    },
};

/// Return a router with all the app's routes.
pub fn build_router<T>(state: AppState<T>) -> Router
where
    T: TransactionStore,
{
    Router::new()
        .route(endpoints::ROOT, get(get_home_page::<T>))
        .route(
            endpoints::TRANSACTIONS_API,
            // `get` also answers HEAD unless HEAD has its own handler.
            get(list_transactions_endpoint::<T>)
                .head(transactions_method_not_allowed)
                .post(create_transaction_endpoint::<T>)
                .fallback(transactions_method_not_allowed),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

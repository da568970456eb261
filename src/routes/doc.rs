use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{AuthResult, LoginRequest, MeResponse, SignUpRequest, UpdateProfileRequest},
        catalog::{CatalogItem, CatalogPage, GroupList},
        orders::{CreateOrderRequest, OrderList, OrderResult, UpdateOrderRequest},
    },
    identity::{IdentityUser, TokenBundle, UserMetadata},
    inventory::Group,
    models::{
        OrderItem, OrderShippingAddress, OrderStatus, OrderUser, PaymentStatus, ShippingAddress,
    },
    response::{ApiResponse, Meta},
    routes::{auth, catalog, health, orders},
    services::reconciliation::{AppliedAdjustment, FailedAdjustment, SyncReport},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        auth::me,
        auth::update_me,
        catalog::list_items,
        catalog::list_groups,
        orders::create_order,
        orders::list_my_orders,
        orders::list_all_orders,
        orders::update_order,
        orders::delete_order
    ),
    components(
        schemas(
            SignUpRequest,
            LoginRequest,
            UpdateProfileRequest,
            AuthResult,
            MeResponse,
            IdentityUser,
            UserMetadata,
            TokenBundle,
            ShippingAddress,
            CatalogItem,
            CatalogPage,
            GroupList,
            Group,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderResult,
            OrderList,
            OrderItem,
            OrderShippingAddress,
            OrderStatus,
            PaymentStatus,
            OrderUser,
            SyncReport,
            AppliedAdjustment,
            FailedAdjustment,
            Meta,
            ApiResponse<CatalogPage>,
            ApiResponse<OrderResult>,
            ApiResponse<OrderList>,
            ApiResponse<AuthResult>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Sign-up, login and profile"),
        (name = "Catalog", description = "Cached point-of-sale catalog"),
        (name = "Orders", description = "Order lifecycle"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

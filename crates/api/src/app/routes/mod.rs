//! Route table.
//!
//! Gates are attached per method with `route_layer`, so one path can mix a
//! public method with a gated one (`POST /users` vs `GET /users`). The role
//! gate is layered first, which makes the credential gate the outer one.

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{MethodRouter, delete, get, patch, post, put},
};

use academy_auth::Role;
use academy_infra::UserStore;

use crate::authz::{RoleGate, role_middleware};
use crate::middleware::{AuthState, auth_middleware};

pub mod classes;
pub mod enrollments;
pub mod instructors;
pub mod payments;
pub mod selections;
pub mod system;
pub mod tokens;
pub mod users;

#[derive(Clone)]
pub struct Gates {
    pub auth: AuthState,
    pub users: Arc<dyn UserStore>,
}

impl Gates {
    /// Credential gate only.
    fn authenticated(&self, route: MethodRouter) -> MethodRouter {
        route.route_layer(from_fn_with_state(self.auth.clone(), auth_middleware))
    }

    /// Credential gate, then a role lookup against the user record.
    fn restricted(&self, role: Role, route: MethodRouter) -> MethodRouter {
        let gate = RoleGate::new(self.users.clone(), role);
        self.authenticated(route.route_layer(from_fn_with_state(gate, role_middleware)))
    }

    fn admin(&self, route: MethodRouter) -> MethodRouter {
        self.restricted(Role::ADMIN, route)
    }

    fn instructor(&self, route: MethodRouter) -> MethodRouter {
        self.restricted(Role::INSTRUCTOR, route)
    }
}

pub fn router(gates: &Gates) -> Router {
    Router::new()
        // System + tokens
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/jwt", post(tokens::issue_token))
        // Users and roles
        .route(
            "/users",
            post(users::create_user).merge(gates.admin(get(users::list_users))),
        )
        .route(
            "/users/admin/:key",
            gates
                .authenticated(get(users::is_admin))
                .merge(gates.admin(patch(users::make_admin))),
        )
        .route(
            "/users/instructor/:key",
            gates
                .authenticated(get(users::is_instructor))
                .merge(gates.admin(patch(users::make_instructor))),
        )
        .route("/instructor", get(users::list_instructors))
        // Catalog
        .route(
            "/classes",
            get(classes::list_classes).merge(gates.instructor(post(classes::create_class))),
        )
        .route("/classes/:id", get(classes::get_class))
        .route("/updateClass/:id", gates.admin(put(classes::review_class)))
        .route("/updateMyClass/:id", gates.instructor(put(classes::revise_my_class)))
        .route("/myClass/:email", gates.authenticated(get(classes::my_classes)))
        .route("/sendFeedback/:id", gates.admin(post(classes::send_feedback)))
        .route("/popularInstructors", get(instructors::popular_instructors))
        // Cart
        .route(
            "/selectedCourse",
            gates.authenticated(post(selections::select_course).get(selections::list_selected)),
        )
        .route(
            "/selectedCourse/:id",
            gates.authenticated(get(selections::get_selected).merge(delete(selections::remove_selected))),
        )
        // Payments + enrollment
        .route(
            "/create-payment-intent",
            gates.authenticated(post(payments::create_payment_intent)),
        )
        .route("/enrolled/:id", gates.authenticated(post(enrollments::enroll)))
        .route("/enrolled", gates.authenticated(get(enrollments::list_enrolled)))
}

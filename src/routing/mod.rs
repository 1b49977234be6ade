//! Route table and the navigation guard.
//!
//! The guard is a pure predicate; actual navigation belongs to the
//! embedding UI, which applies the returned decision.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    RequiresAuth,
    RequiresGuest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteId {
    Login,
    Register,
    Dashboard,
    Prospects,
}

pub struct Route {
    pub id: RouteId,
    pub path: &'static str,
    pub name: &'static str,
    pub access: RouteAccess,
}

pub const ROUTES: [Route; 4] = [
    Route {
        id: RouteId::Login,
        path: "/login",
        name: "Login",
        access: RouteAccess::RequiresGuest,
    },
    Route {
        id: RouteId::Register,
        path: "/register",
        name: "Register",
        access: RouteAccess::RequiresGuest,
    },
    Route {
        id: RouteId::Dashboard,
        path: "/",
        name: "Dashboard",
        access: RouteAccess::RequiresAuth,
    },
    Route {
        id: RouteId::Prospects,
        path: "/prospects",
        name: "Prospects",
        access: RouteAccess::RequiresAuth,
    },
];

pub fn route(id: RouteId) -> &'static Route {
    match id {
        RouteId::Login => &ROUTES[0],
        RouteId::Register => &ROUTES[1],
        RouteId::Dashboard => &ROUTES[2],
        RouteId::Prospects => &ROUTES[3],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    RedirectToDashboard,
}

/// Decide whether a navigation may proceed, given the target's declared
/// requirement and the current session state.
pub fn evaluate(access: RouteAccess, authenticated: bool) -> GuardDecision {
    match access {
        RouteAccess::Public => GuardDecision::Allow,
        RouteAccess::RequiresAuth if authenticated => GuardDecision::Allow,
        RouteAccess::RequiresAuth => GuardDecision::RedirectToLogin,
        RouteAccess::RequiresGuest if authenticated => GuardDecision::RedirectToDashboard,
        RouteAccess::RequiresGuest => GuardDecision::Allow,
    }
}

pub fn guard(route: &Route, authenticated: bool) -> GuardDecision {
    evaluate(route.access, authenticated)
}

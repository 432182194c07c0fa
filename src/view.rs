// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View projection and HTML rendering.
//!
//! [`View::project`] is a pure function of controller state; [`render`]
//! turns a view plus pending notices into a page.

use askama::Template;

use crate::controller::{Controller, Phase};
use crate::models::catalog::CATALOG;
use crate::models::leaderboard::{entries, LeaderboardEntry};
use crate::notify::Delivered;

/// Point adjustments offered per user in the admin panel.
pub const ADMIN_DELTAS: [i64; 6] = [1, 10, 100, -1, -10, -100];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Loading,
    Login(LoginView),
    Dashboard(DashboardView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginView {
    /// Set when sign-up is switched off; the button is disabled with this reason
    pub signup_disabled_reason: Option<String>,
    pub signin_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopItem {
    pub name: &'static str,
    pub cost: i64,
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointControl {
    pub delta: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRow {
    pub user_id: String,
    pub email: String,
    pub points: i64,
    pub controls: Vec<PointControl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub email: String,
    pub points: i64,
    pub shop: Vec<ShopItem>,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Present only for admins
    pub admin: Option<Vec<AdminRow>>,
}

impl View {
    pub fn project(controller: &Controller) -> Self {
        let features = controller.features();
        let session = match (controller.phase(), controller.session()) {
            (Phase::Loading, _) => return View::Loading,
            (Phase::Unauthenticated, _) | (_, None) => {
                return View::Login(LoginView {
                    signup_disabled_reason: (!features.signup_enabled)
                        .then(|| features.signup_disabled_reason.clone()),
                    signin_enabled: features.signin_enabled,
                })
            }
            (_, Some(session)) => session,
        };

        let shop = CATALOG
            .iter()
            .map(|badge| ShopItem {
                name: badge.name,
                cost: badge.cost,
                affordable: session.points >= badge.cost,
            })
            .collect();

        let admin = (controller.phase() == Phase::AuthenticatedAdmin).then(|| {
            controller
                .users()
                .iter()
                .map(|user| AdminRow {
                    user_id: user.id.to_string(),
                    email: user.email.clone(),
                    points: user.points,
                    controls: ADMIN_DELTAS
                        .iter()
                        .map(|&delta| PointControl {
                            delta,
                            label: format!("{:+}", delta),
                        })
                        .collect(),
                })
                .collect()
        });

        View::Dashboard(DashboardView {
            email: session.email.clone(),
            points: session.points,
            shop,
            leaderboard: entries(controller.leaderboard()),
            admin,
        })
    }
}

#[derive(Template)]
#[template(path = "loading.html")]
struct LoadingPage<'a> {
    notices: &'a Delivered,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginPage<'a> {
    view: &'a LoginView,
    notices: &'a Delivered,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage<'a> {
    view: &'a DashboardView,
    notices: &'a Delivered,
}

/// Render a full HTML page.
pub fn render(view: &View, notices: &Delivered) -> Result<String, askama::Error> {
    match view {
        View::Loading => LoadingPage { notices }.render(),
        View::Login(view) => LoginPage { view, notices }.render(),
        View::Dashboard(view) => DashboardPage { view, notices }.render(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Notice;

    fn dashboard(admin: bool) -> DashboardView {
        DashboardView {
            email: "a@example.com".to_string(),
            points: 25,
            shop: CATALOG
                .iter()
                .map(|b| ShopItem {
                    name: b.name,
                    cost: b.cost,
                    affordable: 25 >= b.cost,
                })
                .collect(),
            leaderboard: vec![LeaderboardEntry {
                rank: 1,
                email: "a@example.com".to_string(),
                points: 25,
                badges: vec!["Rank".to_string(), "Merch Item #1".to_string()],
            }],
            admin: admin.then(|| {
                vec![AdminRow {
                    user_id: "uid-1".to_string(),
                    email: "a@example.com".to_string(),
                    points: 25,
                    controls: ADMIN_DELTAS
                        .iter()
                        .map(|&delta| PointControl {
                            delta,
                            label: format!("{:+}", delta),
                        })
                        .collect(),
                }]
            }),
        }
    }

    #[test]
    fn test_login_page_shows_disabled_reason() {
        let view = View::Login(LoginView {
            signup_disabled_reason: Some("Development in progress".to_string()),
            signin_enabled: true,
        });
        let html = render(&view, &Delivered::default()).unwrap();
        assert!(html.contains("Login | Slauson Robotics Points Webapp"));
        assert!(html.contains("Development in progress"));
        assert!(html.contains("disabled"));
    }

    #[test]
    fn test_dashboard_lists_shop_and_leaderboard() {
        let html = render(&View::Dashboard(dashboard(false)), &Delivered::default()).unwrap();
        assert!(html.contains("Account | Slauson Robotics Points Webapp"));
        assert!(html.contains("Hello a@example.com!"));
        assert!(html.contains("You have 25 points."));
        assert!(html.contains("Merch Item #2 - 30 pts"));
        assert!(html.contains("1. a@example.com - 25 pts - Rewards redeemed: Rank, Merch Item #1"));
        assert!(!html.contains("Admin Panel"));
    }

    #[test]
    fn test_admin_panel_only_for_admins() {
        let html = render(&View::Dashboard(dashboard(true)), &Delivered::default()).unwrap();
        assert!(html.contains("Admin Panel"));
        assert!(html.contains("value=\"-100\""));
        assert!(html.contains("+100"));
    }

    #[test]
    fn test_notices_are_escaped() {
        let notices = Delivered {
            toasts: vec![Notice::error("<script>x</script>")],
            alerts: vec![Notice::info("Blocking message")],
        };
        let html = render(&View::Loading, &notices).unwrap();
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<dialog open"));
        assert!(html.contains("Blocking message"));
    }
}

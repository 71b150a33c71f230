use tutor_gate::{
    ActivationPattern, RouteTable,
    matcher::{PathPattern, normalize_path},
    models::{Role, RouteClass},
    route_table::{dashboard_for, is_root_path},
};

#[test]
fn test_default_tables_are_exact() {
    let table = RouteTable::default();
    assert_eq!(
        table.public,
        ["/login", "/register", "/forgot-password", "/reset-password", "/auth"]
    );
    assert_eq!(table.admin, ["/admin-dashboard", "/admin"]);
    assert_eq!(
        table.tutor,
        ["/tutor-dashboard", "/tutor", "/my-sessions", "/availability"]
    );
    assert_eq!(
        table.student,
        ["/dashboard", "/student", "/find-tutors", "/my-bookings"]
    );
    assert_eq!(
        table.common,
        ["/profile", "/settings", "/messages", "/notifications"]
    );
}

#[test]
fn test_classify_every_prefix_into_its_table() {
    let table = RouteTable::default();
    for (class, prefixes) in table.ordered() {
        for prefix in prefixes {
            assert_eq!(table.classify(prefix), class, "{prefix}");
            assert_eq!(table.classify(&format!("{prefix}/deep/path")), class);
        }
    }
}

#[test]
fn test_classify_uses_plain_prefix_matching() {
    let table = RouteTable::default();
    // starts_with semantics, not segment boundaries.
    assert_eq!(table.classify("/administrator"), RouteClass::Admin);
    assert_eq!(table.classify("/tutoring-tips"), RouteClass::Tutor);
    assert_eq!(table.classify("/"), RouteClass::Unmatched);
    assert_eq!(table.classify("/home"), RouteClass::Unmatched);
    assert_eq!(table.classify("/login"), RouteClass::Unmatched);
    assert_eq!(table.classify("/Admin"), RouteClass::Unmatched);
}

#[test]
fn test_public_prefixes() {
    let table = RouteTable::default();
    assert!(table.is_public("/auth/callback/google"));
    assert!(table.is_public("/reset-password?token=abc"));
    assert!(!table.is_public("/dashboard"));
    assert!(!table.is_public("/"));
}

#[test]
fn test_default_tables_do_not_overlap() {
    assert!(RouteTable::default().overlaps().is_empty());
}

#[test]
fn test_overlaps_are_reported() {
    let mut table = RouteTable::default();
    table.student.push("/admin-reports".to_string());

    let overlaps = table.overlaps();
    assert!(overlaps.contains(&(
        "/admin-reports".to_string(),
        RouteClass::Student,
        RouteClass::Admin
    )));
    assert!(overlaps.contains(&("/admin".to_string(), RouteClass::Admin, RouteClass::Student)));
    // Evaluation order still decides.
    assert_eq!(table.classify("/admin-reports"), RouteClass::Admin);
}

#[test]
fn test_dashboards_and_root_paths() {
    assert_eq!(dashboard_for(Role::Admin), "/admin-dashboard");
    assert_eq!(dashboard_for(Role::Tutor), "/tutor-dashboard");
    assert_eq!(dashboard_for(Role::Student), "/dashboard");
    assert!(is_root_path("/"));
    assert!(is_root_path("/home"));
    assert!(!is_root_path("/home/feed"));
}

// --- Activation pattern ---

#[test]
fn test_path_pattern_parsing() {
    assert_eq!(
        PathPattern::parse("/admin/:path*"),
        PathPattern::Subtree("/admin".to_string())
    );
    assert_eq!(PathPattern::parse("/home"), PathPattern::Exact("/home".to_string()));
}

#[test]
fn test_subtree_pattern_is_segment_aware() {
    let pattern = PathPattern::parse("/admin/:path*");
    assert!(pattern.matches("/admin"));
    assert!(pattern.matches("/admin/"));
    assert!(pattern.matches("/admin/users/42"));
    assert!(!pattern.matches("/administrator"));
    assert!(!pattern.matches("/"));
}

#[test]
fn test_activation_with_root() {
    let table = RouteTable::default();
    let activation = ActivationPattern::from_table(&table, true);

    assert!(activation.matches("/"));
    assert!(activation.matches("/home"));
    assert!(activation.matches("/tutor-dashboard/bookings"));
    assert!(activation.matches("/messages"));
    assert!(!activation.matches("/login"));
    assert!(!activation.matches("/_gate/health"));
    assert!(!activation.matches("/home/feed"));
    assert_eq!(activation.patterns().len(), 16);
}

#[test]
fn test_activation_without_root() {
    let table = RouteTable::default();
    let activation = ActivationPattern::from_table(&table, false);

    assert!(!activation.matches("/"));
    assert!(!activation.matches("/home"));
    assert!(activation.matches("/dashboard"));
    assert_eq!(activation.patterns().len(), 14);
}

#[test]
fn test_activation_from_raw_patterns() {
    let activation = ActivationPattern::from_patterns(["/", "/dashboard/:path*"]);
    assert!(activation.matches("/"));
    assert!(activation.matches("/dashboard/sessions"));
    assert!(!activation.matches("/profile"));
}

// --- Path normalization ---

#[test]
fn test_normalize_resolves_dot_segments() {
    assert_eq!(normalize_path("/x/../admin-dashboard"), "/admin-dashboard");
    assert_eq!(normalize_path("/login/./../admin"), "/admin");
    assert_eq!(normalize_path("/../../dashboard"), "/dashboard");
    assert_eq!(normalize_path("/tutor/bookings/.."), "/tutor/");
    assert_eq!(normalize_path("/profile/."), "/profile/");
}

#[test]
fn test_normalize_resolves_encoded_dot_segments() {
    assert_eq!(normalize_path("/x/%2e%2e/admin-dashboard"), "/admin-dashboard");
    assert_eq!(normalize_path("/x/%2E%2E/admin-dashboard"), "/admin-dashboard");
    assert_eq!(normalize_path("/x/.%2e/admin"), "/admin");
    assert_eq!(normalize_path("/x/%2e./admin"), "/admin");
    assert_eq!(normalize_path("/auth/%2e/x"), "/auth/x");
}

#[test]
fn test_normalize_treats_backslash_as_separator() {
    assert_eq!(normalize_path("/register\\..\\admin"), "/admin");
}

#[test]
fn test_normalize_leaves_plain_paths_alone() {
    for path in ["/", "/home", "/admin/", "/messages/thread-7", "/a//b", "/files/%2e%2ehidden", "/v1.2/..x"] {
        assert_eq!(normalize_path(path), path, "{path}");
    }
}

#[test]
fn test_activation_sees_normalized_paths() {
    let activation = ActivationPattern::from_table(&RouteTable::default(), false);
    assert!(!activation.matches("/x/../admin-dashboard"));
    assert!(activation.matches(&normalize_path("/x/../admin-dashboard")));
    assert!(activation.matches(&normalize_path("/x/%2e%2e/admin-dashboard")));
}

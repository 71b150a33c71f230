/// Router Module Index
///
/// The gateway answers a handful of endpoints itself under `/_gate`; every other path
/// falls through to the upstream relay installed in `create_router`. The route guard
/// wraps both, and its activation pattern is what keeps `/_gate` unguarded.

/// Gateway endpoints under `/_gate` (health, decision preview).
pub mod gateway;

//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`require_auth`] - 认证中间件 (JWT)
//! - [`require_device_auth`] - 传感器接口认证 (JWT / Basic)
//! - [`require_staff`] - 员工权限中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{AuthScheme, CurrentUserExt, require_auth, require_device_auth, require_staff};

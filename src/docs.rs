use crate::api::analytics::{DepartmentUsage, TypeUsage};
use crate::api::balance::SetBalance;
use crate::api::calendar::CalcDays;
use crate::api::department::DepartmentReq;
use crate::api::leave_request::{ActionReq, ApplyLeave, LeaveAction};
use crate::api::user::{CreateUser, ResetPassword, UpdateUser};
use crate::auth::handlers::LoginResponse;
use crate::model::balance::BalanceView;
use crate::model::department::DepartmentWithHod;
use crate::model::leave_request::LeaveRequestView;
use crate::model::leave_type::LeaveType;
use crate::model::user::UserPublic;
use crate::models::LoginReqDto;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management System

Employees submit leave requests, department heads (HODs) give a first
approval, and an administrator gives the final sign-off, manages balances,
departments, and user accounts.

### 🔹 Key Features
- **Leave Requests**
  - Submit, list (role-scoped), HOD and admin decisions
- **Directory**
  - Departments with one-HOD-per-department, user accounts
- **Balances**
  - Per-user, per-type remaining days; deducted on final approval
- **Calendar**
  - Configured holidays and working-day calculation

### 🔐 Security
Protected endpoints use **JWT Bearer authentication**; directory and
balance mutations are admin-only.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::calendar::holidays,
        crate::api::calendar::working_days,

        crate::api::department::list_departments,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,
        crate::api::user::reset_password,

        crate::api::leave_request::apply,
        crate::api::leave_request::list,
        crate::api::leave_request::get_one,
        crate::api::leave_request::hod_action,
        crate::api::leave_request::admin_action,

        crate::api::balance::list_balances,
        crate::api::balance::set_balance,

        crate::api::leave_type::list_leave_types,

        crate::api::analytics::departments_usage,
        crate::api::analytics::types_usage
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserPublic,
            CreateUser,
            UpdateUser,
            ResetPassword,
            DepartmentReq,
            DepartmentWithHod,
            ApplyLeave,
            ActionReq,
            LeaveAction,
            LeaveRequestView,
            LeaveType,
            BalanceView,
            SetBalance,
            CalcDays,
            DepartmentUsage,
            TypeUsage
        )
    ),
    tags(
        (name = "Auth", description = "Login and session APIs"),
        (name = "Leave", description = "Leave request APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "User", description = "User account APIs"),
        (name = "Balance", description = "Leave balance APIs"),
        (name = "Calendar", description = "Holiday calendar APIs"),
        (name = "Analytics", description = "Admin reporting APIs"),
    )
)]
pub struct ApiDoc;

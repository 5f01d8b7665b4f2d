pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_STUDENT: &str = "student";

/// Role-based destination after a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portal {
    Teacher,
    Student,
}

impl Portal {
    /// `teacher` (any casing) lands in the teacher area; every other role
    /// label lands in the student area.
    pub fn for_role(role: &str) -> Self {
        if role.eq_ignore_ascii_case(ROLE_TEACHER) {
            Portal::Teacher
        } else {
            Portal::Student
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Portal::Teacher => "/teacher/dashboard",
            Portal::Student => "/student/dashboard",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teacher_role_routes_to_teacher_portal() {
        assert_eq!(Portal::for_role("Teacher"), Portal::Teacher);
        assert_eq!(Portal::for_role("teacher"), Portal::Teacher);
        assert_eq!(Portal::Teacher.path(), "/teacher/dashboard");
    }

    #[test]
    fn everything_else_routes_to_student_portal() {
        assert_eq!(Portal::for_role("student"), Portal::Student);
        assert_eq!(Portal::for_role("admin"), Portal::Student);
        assert_eq!(Portal::Student.path(), "/student/dashboard");
    }
}

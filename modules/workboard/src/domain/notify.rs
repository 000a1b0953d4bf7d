use crate::contract::model::{Project, Task, User};
use crate::domain::ports::OutboundEmail;

const DATE_FORMAT: &str = "%d/%m/%Y";
const SIGNATURE: &str = "<p>Please check your dashboard for more details.</p>\
                         <p>Best regards,<br>Project Management Team</p>";

/// Message sent to an employee who was attached to a project.
pub fn project_assignment_email(employee: &User, project: &Project) -> OutboundEmail {
    let html_body = format!(
        "<h3>Project Assignment Notification</h3>\
         <p>Dear {name},</p>\
         <p>You have been assigned to the project: <strong>{title}</strong></p>\
         <p>Project Details:</p>\
         <ul>\
         <li>Start Date: {start}</li>\
         <li>End Date: {end}</li>\
         <li>Required Skills: {skills}</li>\
         <li>Criticality: {criticality}</li>\
         </ul>{SIGNATURE}",
        name = escape(&employee.full_name()),
        title = escape(&project.title),
        start = project.start_date.format(DATE_FORMAT),
        end = project.end_date.format(DATE_FORMAT),
        skills = escape(&project.skills_required),
        criticality = escape(&project.criticality),
    );
    OutboundEmail {
        to: employee.email.clone(),
        subject: format!("Project Assignment: {}", project.title),
        html_body,
    }
}

/// Message sent to the assignee of a newly created task.
pub fn task_assignment_email(employee: &User, task: &Task, project_title: &str) -> OutboundEmail {
    let html_body = format!(
        "<h3>Task Assignment Notification</h3>\
         <p>Dear {name},</p>\
         <p>You have been assigned a new task: <strong>{title}</strong></p>\
         <p>Task Details:</p>\
         <ul>\
         <li>Project: {project}</li>\
         <li>Description: {description}</li>\
         <li>Due Date: {due}</li>\
         <li>Priority: {priority}</li>\
         </ul>{SIGNATURE}",
        name = escape(&employee.full_name()),
        title = escape(&task.title),
        project = escape(project_title),
        description = escape(&task.description),
        due = task.due_date.format(DATE_FORMAT),
        priority = escape(&task.priority),
    );
    OutboundEmail {
        to: employee.email.clone(),
        subject: format!("New Task Assignment: {}", task.title),
        html_body,
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

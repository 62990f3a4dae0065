// Sample documents the editors start with.

pub const DEFAULT_JOB_DESCRIPTION: &str = "\
Senior Full Stack Engineer
We are seeking a Senior Full Stack Engineer proficient in React (Hooks, Context), Node.js (Express), and MongoDB (Mongoose). The ideal candidate must have experience with cloud deployments (AWS or GCP), CI/CD pipelines (GitHub Actions), and advanced TypeScript. Strong knowledge of RESTful API design, state management (Redux or Zustand), and agile methodologies is required. Experience with real-time data or GraphQL is a significant plus.";

pub const DEFAULT_RESUME_TEXT: &str = "\
John Doe
(123) 456-7890 | john.doe@email.com | LinkedIn Profile
Summary: Highly skilled software developer with 6 years of experience building scalable web applications. Proficient in JavaScript, React, and server-side logic using Python (Django).
Experience:
Senior Developer, Tech Innovators (2020-Present)
- Led development of customer-facing portals using React and Redux for state management.
- Designed and implemented REST APIs using Express.js and deployed applications via Docker.
Skills:
Frontend: React, Redux, JavaScript, HTML, CSS, Tailwind CSS
Backend: Node.js, Express.js, Python, Django, PostgreSQL
DevOps: Docker, Git, CI/CD, AWS (S3, EC2)";
